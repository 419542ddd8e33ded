use super::ConfigError;

/// Constructor validation lifecycle shared by stage structs.
///
/// Construction either yields a fully initialized stage or fails with a
/// [`ConfigError`]; no partially constructed stage is observable.
pub trait KernelLifecycle: Sized {
    /// Stage config type.
    type Config;

    /// Construct a validated stage from config.
    fn try_new(config: Self::Config) -> Result<Self, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, KernelLifecycle};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct DummyConfig {
        decimation: usize,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct DummyStage {
        decimation: usize,
    }

    impl KernelLifecycle for DummyStage {
        type Config = DummyConfig;

        fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
            if config.decimation < 2 {
                return Err(ConfigError::InvalidArgument {
                    arg: "decimation",
                    reason: "decimation factor must be at least 2",
                });
            }
            Ok(Self {
                decimation: config.decimation,
            })
        }
    }

    #[test]
    fn lifecycle_constructor_accepts_valid_config() {
        let stage = DummyStage::try_new(DummyConfig { decimation: 4 }).expect("valid config");
        assert_eq!(stage.decimation, 4);
    }

    #[test]
    fn lifecycle_constructor_rejects_invalid_config() {
        let err = DummyStage::try_new(DummyConfig { decimation: 1 }).expect_err("invalid config");
        assert_eq!(
            err,
            ConfigError::InvalidArgument {
                arg: "decimation",
                reason: "decimation factor must be at least 2",
            }
        );
    }
}
