use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placement target for tensors and model parameters.
///
/// Parsed from the strings used in model configuration:
/// `"cpu"`, `"cuda"` (first GPU) and `"cuda:N"`.
///
/// # Example
/// ```
/// use detector_models::backend::Device;
///
/// let dev: Device = "cuda:1".parse().unwrap();
/// assert_eq!(dev, Device::Cuda(1));
/// assert_eq!(dev.to_string(), "cuda:1");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// Host memory.
    #[default]
    Cpu,
    /// CUDA device with the given ordinal.
    Cuda(usize),
}

impl Device {
    /// Returns `true` for host memory.
    pub fn is_cpu(&self) -> bool {
        matches!(self, Device::Cpu)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

impl FromStr for Device {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        match norm.as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda(0)),
            other => {
                let ordinal = other
                    .strip_prefix("cuda:")
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| ModelError::InvalidDevice(s.to_string()))?;
                Ok(Device::Cuda(ordinal))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("  CPU ".parse::<Device>().unwrap(), Device::Cpu);
    }

    #[test]
    fn test_parse_cuda_defaults_to_first_gpu() {
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda(0));
    }

    #[test]
    fn test_parse_cuda_ordinal() {
        assert_eq!("cuda:3".parse::<Device>().unwrap(), Device::Cuda(3));
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            "tpu".parse::<Device>(),
            Err(ModelError::InvalidDevice(_))
        ));
        assert!("gpu".parse::<Device>().is_err());
        assert!("cuda:x".parse::<Device>().is_err());
        assert!("cuda:".parse::<Device>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for dev in [Device::Cpu, Device::Cuda(0), Device::Cuda(7)] {
            assert_eq!(dev.to_string().parse::<Device>().unwrap(), dev);
        }
    }

    #[test]
    fn test_default_is_cpu() {
        assert!(Device::default().is_cpu());
    }
}
