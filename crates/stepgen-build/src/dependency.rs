//! Project dependency graph and dependency resolution
//!
//! Resolution copies the public include paths and export defines of every
//! transitive dependency into the dependent configuration with the same
//! target, then marks the configuration resolved. Finalize refuses to run on
//! configurations that have not been through this pass.

use crate::error::{BuildError, BuildResult};
use crate::project::Project;
use crate::target::Target;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A project in the dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    pub name: String,
    /// Names of projects this one depends on, in any configuration
    pub dependencies: Vec<String>,
}

impl ProjectNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// Dependency graph between projects
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, ProjectNode>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from the union of every configuration's dependencies
    pub fn from_projects(projects: &[Project]) -> Self {
        let mut graph = Self::new();
        for project in projects {
            let mut dependencies: Vec<String> = Vec::new();
            for dep in project.configurations.iter().flat_map(|c| &c.dependencies) {
                if !dependencies.contains(dep) {
                    dependencies.push(dep.clone());
                }
            }
            graph.add_node(ProjectNode::new(&project.name).with_dependencies(dependencies));
        }
        graph
    }

    pub fn add_node(&mut self, node: ProjectNode) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        self.nodes.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that every dependency names a known project
    pub fn validate(&self) -> BuildResult<()> {
        for (name, node) in &self.nodes {
            for dep in &node.dependencies {
                if !self.nodes.contains_key(dep) {
                    return Err(BuildError::project_not_found(format!(
                        "{} (required by {})",
                        dep, name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Dependencies-first order (Kahn's algorithm, ties broken by name)
    pub fn compute_build_order(&self) -> BuildResult<Vec<String>> {
        let mut in_degree: BTreeMap<&str, usize> = self
            .nodes
            .iter()
            .map(|(name, node)| (name.as_str(), node.dependencies.len()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(current) = ready.pop_first() {
            order.push(current.to_string());

            for (dependent, node) in &self.nodes {
                if node.dependencies.iter().any(|d| d == current) {
                    if let Some(degree) = in_degree.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(dependent.as_str());
                        }
                    }
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(BuildError::CircularDependency(self.find_cycle()));
        }
        Ok(order)
    }

    fn find_cycle(&self) -> String {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for name in self.nodes.keys() {
            if let Some(cycle) = self.dfs_find_cycle(name, &mut visited, &mut stack) {
                return cycle;
            }
        }
        "unknown cycle".to_string()
    }

    fn dfs_find_cycle(
        &self,
        name: &str,
        visited: &mut HashSet<String>,
        stack: &mut Vec<String>,
    ) -> Option<String> {
        if let Some(start) = stack.iter().position(|n| n == name) {
            let mut cycle = stack[start..].to_vec();
            cycle.push(name.to_string());
            return Some(cycle.join(" -> "));
        }
        if !visited.insert(name.to_string()) {
            return None;
        }

        stack.push(name.to_string());
        if let Some(node) = self.nodes.get(name) {
            for dep in &node.dependencies {
                if let Some(cycle) = self.dfs_find_cycle(dep, visited, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        None
    }
}

/// Indices of every project reachable from `direct` for one target, nearest first
fn transitive_dependencies(
    projects: &[Project],
    index: &HashMap<&str, usize>,
    target: &Target,
    direct: &[String],
) -> BuildResult<Vec<usize>> {
    let mut seen: Vec<usize> = Vec::new();
    let mut pending: Vec<&str> = direct.iter().rev().map(String::as_str).collect();

    while let Some(name) = pending.pop() {
        let idx = *index
            .get(name)
            .ok_or_else(|| BuildError::project_not_found(name))?;
        if seen.contains(&idx) {
            continue;
        }
        seen.push(idx);

        let conf = projects[idx]
            .configuration(target)
            .ok_or_else(|| BuildError::MissingConfiguration {
                project: name.to_string(),
                target: target.to_string(),
            })?;
        pending.extend(conf.dependencies.iter().rev().map(String::as_str));
    }
    Ok(seen)
}

/// Propagate dependency include paths and export defines, then mark every
/// configuration resolved
pub fn resolve_dependencies(projects: &mut [Project]) -> BuildResult<()> {
    let graph = DependencyGraph::from_projects(projects);
    graph.validate()?;
    let order = graph.compute_build_order()?;

    let names: Vec<String> = projects.iter().map(|p| p.name.clone()).collect();
    let index: HashMap<&str, usize> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();

    for name in &order {
        let i = index[name.as_str()];

        for c in 0..projects[i].configurations.len() {
            let (target, direct) = {
                let conf = &projects[i].configurations[c];
                (conf.target, conf.dependencies.clone())
            };

            let mut include_paths = Vec::new();
            let mut defines = Vec::new();
            for dep in transitive_dependencies(projects, &index, &target, &direct)? {
                if let Some(dep_conf) = projects[dep].configuration(&target) {
                    include_paths.extend(dep_conf.include_paths.iter().cloned());
                    defines.extend(dep_conf.export_defines.iter().cloned());
                }
            }

            let conf = &mut projects[i].configurations[c];
            for path in include_paths {
                if !conf.dependencies_include_paths.contains(&path) {
                    conf.dependencies_include_paths.push(path);
                }
            }
            for define in defines {
                if !conf.defines.contains(&define) {
                    conf.defines.push(define);
                }
            }
            conf.mark_resolved();
            debug!(project = %name, target = %target, "configuration resolved");
        }
    }
    Ok(())
}
