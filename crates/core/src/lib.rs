pub mod domain;
pub mod pricing;
pub mod storage;
pub mod time;

pub mod config {
    use anyhow::Context;

    use crate::time::reference::TimeReference;

    /// How the request layer reports a query with no applicable price.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub enum NotFoundPolicy {
        /// Answer 200 with the zero-valued body.
        #[default]
        Zeroed,
        /// Answer 404.
        NotFound,
    }

    impl std::str::FromStr for NotFoundPolicy {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> anyhow::Result<Self> {
            match s.trim().to_ascii_lowercase().as_str() {
                "" | "zeroed" => Ok(Self::Zeroed),
                "not_found" | "404" => Ok(Self::NotFound),
                other => anyhow::bail!("unknown not-found policy: {other}"),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub sentry_dsn: Option<String>,
        pub time_zone: Option<String>,
        pub not_found: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                time_zone: std::env::var("PRICING_TIME_ZONE").ok(),
                not_found: std::env::var("PRICING_NOT_FOUND").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn time_reference(&self) -> anyhow::Result<TimeReference> {
            match self.time_zone.as_deref() {
                None => Ok(TimeReference::utc()),
                Some(s) => s
                    .parse()
                    .with_context(|| format!("invalid PRICING_TIME_ZONE: {s}")),
            }
        }

        pub fn not_found_policy(&self) -> anyhow::Result<NotFoundPolicy> {
            match self.not_found.as_deref() {
                None => Ok(NotFoundPolicy::default()),
                Some(s) => s
                    .parse()
                    .with_context(|| format!("invalid PRICING_NOT_FOUND: {s}")),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn settings(time_zone: Option<&str>, not_found: Option<&str>) -> Settings {
            Settings {
                database_url: None,
                sentry_dsn: None,
                time_zone: time_zone.map(str::to_string),
                not_found: not_found.map(str::to_string),
            }
        }

        #[test]
        fn defaults_to_utc_and_zeroed() {
            let s = settings(None, None);
            assert_eq!(s.time_reference().unwrap(), TimeReference::utc());
            assert_eq!(s.not_found_policy().unwrap(), NotFoundPolicy::Zeroed);
            assert!(s.require_database_url().is_err());
        }

        #[test]
        fn parses_explicit_values() {
            let s = settings(Some("+02:00"), Some("not_found"));
            assert_eq!(s.time_reference().unwrap().offset_seconds(), 7200);
            assert_eq!(s.not_found_policy().unwrap(), NotFoundPolicy::NotFound);
        }

        #[test]
        fn rejects_garbage() {
            let s = settings(Some("Mars/Olympus"), Some("maybe"));
            assert!(s.time_reference().is_err());
            assert!(s.not_found_policy().is_err());
        }
    }
}
