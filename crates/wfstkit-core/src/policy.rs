// Error severity switch.

/// How a detected error is surfaced.
///
/// Chosen once by the caller (for the command-line tools, at process start)
/// and carried by value into every algorithm and reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Log the error and hand it back to the caller as a recoverable failure.
    #[default]
    Report,
    /// Log the error and terminate the process with exit code 1.
    Fatal,
}

impl ErrorPolicy {
    pub fn from_fatal_flag(fatal: bool) -> Self {
        if fatal { Self::Fatal } else { Self::Report }
    }

    /// Surface `err` according to the policy.
    ///
    /// Under [`ErrorPolicy::Report`] the error is logged and returned so it
    /// can be propagated with `?`. Under [`ErrorPolicy::Fatal`] this does not
    /// return.
    pub fn raise<E: std::fmt::Display>(self, err: E) -> E {
        log::error!("{err}");
        if self == Self::Fatal {
            std::process::exit(1);
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_is_default() {
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Report);
    }

    #[test]
    fn from_flag() {
        assert_eq!(ErrorPolicy::from_fatal_flag(true), ErrorPolicy::Fatal);
        assert_eq!(ErrorPolicy::from_fatal_flag(false), ErrorPolicy::Report);
    }

    #[test]
    fn report_returns_the_error() {
        let err = ErrorPolicy::Report.raise("dangling arc");
        assert_eq!(err, "dangling arc");
    }
}
