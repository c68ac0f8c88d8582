//! Argument resolution for custom build steps
//!
//! Resolution reads a fully resolved configuration and produces the define
//! string, include path list and forced include used on a step's command line.
//! It has no side effects, so resolving the same configuration twice yields
//! equal bundles.

use crate::project::Configuration;
use crate::target::{DevEnv, Platform, Target};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defines added to every step of configurations matching a platform and dev env
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalDefinition {
    pub platforms: Vec<Platform>,
    pub dev_envs: Vec<DevEnv>,
    pub defines: Vec<String>,
}

impl AdditionalDefinition {
    pub fn new(platforms: Vec<Platform>, dev_envs: Vec<DevEnv>, defines: Vec<String>) -> Self {
        Self {
            platforms,
            dev_envs,
            defines,
        }
    }

    /// Both the platform and the dev env must be listed
    pub fn matches(&self, target: &Target) -> bool {
        self.platforms.contains(&target.platform) && self.dev_envs.contains(&target.dev_env)
    }
}

/// Per-configuration argument bundle shared by all steps of that configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedArguments {
    /// `-D` prefixed defines joined by single spaces
    pub defines: String,
    /// Own, dependency and private include paths, first occurrence wins
    pub include_paths: Vec<PathBuf>,
    /// Precompiled header forced into header-sourced steps
    pub forced_include: Option<PathBuf>,
}

impl ResolvedArguments {
    /// Resolve the bundle for a configuration
    pub fn resolve(conf: &Configuration, additional: &[AdditionalDefinition]) -> Self {
        let extra = additional
            .iter()
            .filter(|a| a.matches(&conf.target))
            .flat_map(|a| a.defines.iter());

        let mut defines: Vec<String> = Vec::new();
        for define in conf.defines.iter().chain(extra) {
            let stripped = define.replace(' ', "");
            if !stripped.is_empty() && !defines.contains(&stripped) {
                defines.push(stripped);
            }
        }

        let mut include_paths: Vec<PathBuf> = Vec::new();
        for path in conf
            .include_paths
            .iter()
            .chain(&conf.dependencies_include_paths)
            .chain(&conf.include_private_paths)
        {
            if !include_paths.contains(path) {
                include_paths.push(path.clone());
            }
        }

        Self {
            defines: defines
                .iter()
                .map(|d| format!("-D{}", d))
                .collect::<Vec<_>>()
                .join(" "),
            include_paths,
            forced_include: conf
                .precomp_header
                .as_ref()
                .filter(|h| !h.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Include paths as they appear on a command line, optionally relative to `base`
    pub fn quoted_include_paths(&self, base: Option<&Path>) -> Vec<String> {
        self.include_paths
            .iter()
            .map(|p| quote_path(&relative_to(p, base)))
            .collect()
    }
}

/// Express `path` relative to `base` when both allow it
pub fn relative_to(path: &Path, base: Option<&Path>) -> PathBuf {
    base.and_then(|b| pathdiff::diff_paths(path, b))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Wrap a path in double quotes if it contains a space
pub fn quote_path(path: &Path) -> String {
    let text = path.to_string_lossy();
    if text.contains(' ') {
        format!("\"{}\"", text)
    } else {
        text.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Optimization;
    use pretty_assertions::assert_eq;

    fn target() -> Target {
        Target::new(Platform::Win64, DevEnv::Vs2022, Optimization::Debug)
    }

    #[test]
    fn test_defines_strip_spaces_and_prefix() {
        let conf = Configuration::new(target())
            .with_defines(vec!["FOO".to_string(), "BAR BAZ".to_string()]);
        let args = ResolvedArguments::resolve(&conf, &[]);
        assert_eq!(args.defines, "-DFOO -DBARBAZ");
    }

    #[test]
    fn test_include_paths_quoted_when_spaced() {
        let conf = Configuration::new(target()).with_include_paths(vec![
            PathBuf::from(r"C:\inc"),
            PathBuf::from(r"C:\has space"),
        ]);
        let args = ResolvedArguments::resolve(&conf, &[]);
        assert_eq!(
            args.quoted_include_paths(None),
            vec![r"C:\inc".to_string(), r#""C:\has space""#.to_string()]
        );
    }

    #[test]
    fn test_include_union_order_and_dedup() {
        let mut conf = Configuration::new(target())
            .with_include_paths(vec![PathBuf::from("/own")])
            .with_private_include_paths(vec![PathBuf::from("/private"), PathBuf::from("/own")]);
        conf.dependencies_include_paths = vec![PathBuf::from("/dep")];

        let args = ResolvedArguments::resolve(&conf, &[]);
        assert_eq!(
            args.include_paths,
            vec![
                PathBuf::from("/own"),
                PathBuf::from("/dep"),
                PathBuf::from("/private")
            ]
        );
    }

    #[test]
    fn test_additional_definitions_only_when_matching() {
        let conf = Configuration::new(target()).with_defines(vec!["A".to_string()]);
        let additional = vec![
            AdditionalDefinition::new(
                vec![Platform::Win64],
                vec![DevEnv::Vs2022],
                vec!["WIN64".to_string()],
            ),
            AdditionalDefinition::new(
                vec![Platform::Win64],
                vec![DevEnv::Vs2019],
                vec!["OLD_VS".to_string()],
            ),
        ];
        let args = ResolvedArguments::resolve(&conf, &additional);
        assert_eq!(args.defines, "-DA -DWIN64");
    }

    #[test]
    fn test_forced_include_from_precompiled_header() {
        let conf = Configuration::new(target()).with_precompiled("pch.h", "pch.cpp");
        let args = ResolvedArguments::resolve(&conf, &[]);
        assert_eq!(args.forced_include, Some(PathBuf::from("pch.h")));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let conf = Configuration::new(target())
            .with_defines(vec!["X Y".to_string()])
            .with_include_paths(vec![PathBuf::from("/a b")]);
        assert_eq!(
            ResolvedArguments::resolve(&conf, &[]),
            ResolvedArguments::resolve(&conf, &[])
        );
    }

    #[test]
    fn test_relative_rendering() {
        let args = ResolvedArguments {
            include_paths: vec![PathBuf::from("/repo/engine/include")],
            ..Default::default()
        };
        assert_eq!(
            args.quoted_include_paths(Some(Path::new("/repo/ide"))),
            vec!["../engine/include".to_string()]
        );
    }
}
