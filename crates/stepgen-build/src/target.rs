//! Build targets
//!
//! A target is one point of the platform x dev env x optimization matrix.
//! Inside a project each configuration is identified by its target.

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Win32,
    Win64,
    Durango,
    Android,
    Mac,
    Linux,
}

impl Platform {
    /// Get platform name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Win64 => "win64",
            Self::Durango => "durango",
            Self::Android => "android",
            Self::Mac => "mac",
            Self::Linux => "linux",
        }
    }

    /// Get all known platforms
    pub fn all() -> [Platform; 6] {
        [
            Self::Win32,
            Self::Win64,
            Self::Durango,
            Self::Android,
            Self::Mac,
            Self::Linux,
        ]
    }
}

impl FromStr for Platform {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        let lower = s.to_lowercase();
        Self::all()
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| BuildError::InvalidTarget(format!("unknown platform '{}'", s)))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Development environment the project files are generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevEnv {
    Vs2017,
    Vs2019,
    Vs2022,
    Xcode,
    Make,
}

impl DevEnv {
    /// Get dev env name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vs2017 => "vs2017",
            Self::Vs2019 => "vs2019",
            Self::Vs2022 => "vs2022",
            Self::Xcode => "xcode",
            Self::Make => "make",
        }
    }

    /// Get all known dev envs
    pub fn all() -> [DevEnv; 5] {
        [
            Self::Vs2017,
            Self::Vs2019,
            Self::Vs2022,
            Self::Xcode,
            Self::Make,
        ]
    }
}

impl FromStr for DevEnv {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        let lower = s.to_lowercase();
        Self::all()
            .into_iter()
            .find(|d| d.name() == lower)
            .ok_or_else(|| BuildError::InvalidTarget(format!("unknown dev env '{}'", s)))
    }
}

impl fmt::Display for DevEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Optimization level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimization {
    Debug,
    Release,
    Retail,
}

impl Optimization {
    /// Get optimization name as used in configuration names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Debug => "Debug",
            Self::Release => "Release",
            Self::Retail => "Retail",
        }
    }

    /// Get all optimization levels
    pub fn all() -> [Optimization; 3] {
        [Self::Debug, Self::Release, Self::Retail]
    }
}

impl FromStr for Optimization {
    type Err = BuildError;

    fn from_str(s: &str) -> BuildResult<Self> {
        Self::all()
            .into_iter()
            .find(|o| o.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| BuildError::InvalidTarget(format!("unknown optimization '{}'", s)))
    }
}

impl fmt::Display for Optimization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Configuration identity: one platform, dev env and optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Target {
    pub platform: Platform,
    pub dev_env: DevEnv,
    pub optimization: Optimization,
}

impl Target {
    /// Create a new target
    pub fn new(platform: Platform, dev_env: DevEnv, optimization: Optimization) -> Self {
        Self {
            platform,
            dev_env,
            optimization,
        }
    }

    /// Short configuration name used in step descriptions
    pub fn name(&self) -> &'static str {
        self.optimization.name()
    }

    /// Enumerate every combination, in declaration order
    pub fn matrix(
        platforms: &[Platform],
        dev_envs: &[DevEnv],
        optimizations: &[Optimization],
    ) -> Vec<Target> {
        let mut targets = Vec::with_capacity(platforms.len() * dev_envs.len() * optimizations.len());
        for &platform in platforms {
            for &dev_env in dev_envs {
                for &optimization in optimizations {
                    targets.push(Target::new(platform, dev_env, optimization));
                }
            }
        }
        targets
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.optimization, self.platform, self.dev_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_parse_is_case_insensitive() {
        assert_eq!("Win64".parse::<Platform>().unwrap(), Platform::Win64);
        assert_eq!("durango".parse::<Platform>().unwrap(), Platform::Durango);
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_dev_env_parse() {
        assert_eq!("VS2022".parse::<DevEnv>().unwrap(), DevEnv::Vs2022);
        assert!("vs2005".parse::<DevEnv>().is_err());
    }

    #[test]
    fn test_optimization_parse_and_name() {
        let opt: Optimization = "release".parse().unwrap();
        assert_eq!(opt, Optimization::Release);
        assert_eq!(opt.name(), "Release");
    }

    #[test]
    fn test_target_name_is_optimization() {
        let target = Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Debug);
        assert_eq!(target.name(), "Debug");
        assert_eq!(target.to_string(), "Debug|win64|vs2022");
    }

    #[test]
    fn test_matrix_order() {
        let targets = Target::matrix(
            &[Platform::Win64],
            &[DevEnv::Vs2019, DevEnv::Vs2022],
            &[Optimization::Debug, Optimization::Release],
        );
        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0].dev_env, DevEnv::Vs2019);
        assert_eq!(targets[1].optimization, Optimization::Release);
        assert_eq!(targets[3].dev_env, DevEnv::Vs2022);
    }

    #[test]
    fn test_empty_matrix() {
        assert!(Target::matrix(&[], &[DevEnv::Vs2022], &[Optimization::Debug]).is_empty());
    }
}
