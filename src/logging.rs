//! Logging initialization utilities.

use env_logger::Env;

/// Initialize logging. `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose));
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "info"
    } else {
        "warn"
    }
}

#[cfg(test)]
mod tests {
    use super::default_filter;

    #[test]
    fn verbose_raises_default_filter() {
        assert_eq!(default_filter(false), "warn");
        assert_eq!(default_filter(true), "info");
    }
}
