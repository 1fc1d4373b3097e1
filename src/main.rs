fn main() {
    cookie_inspector::cli::run();
}
