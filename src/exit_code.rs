use crate::error::CookieError;

pub fn exit_code_for_error(err: &CookieError) -> i32 {
    match err {
        CookieError::Validation(_) | CookieError::Config(_) => 2,
        CookieError::InvalidUrl(_) => 3,
        CookieError::Parse(_) | CookieError::Json(_) => 26,
        CookieError::Io(_) => 23,
        CookieError::PermissionDenied(_) | CookieError::FileNotFound(_) => 37,
        CookieError::HostUnavailable => 69,
        CookieError::WriteRejected(_) => 73,
        CookieError::Host(_) => 74,
    }
}

#[cfg(test)]
mod tests {
    use super::exit_code_for_error;
    use crate::error::CookieError;

    #[test]
    fn exit_code_maps_invalid_url() {
        let err = CookieError::InvalidUrl("bad".to_string());
        assert_eq!(exit_code_for_error(&err), 3);
    }

    #[test]
    fn exit_code_separates_unavailable_from_host_failure() {
        assert_eq!(exit_code_for_error(&CookieError::HostUnavailable), 69);
        assert_eq!(
            exit_code_for_error(&CookieError::Host("gone".to_string())),
            74
        );
    }
}
