//! Build task catalogue and dependency graph
//!
//! Tasks can require other tasks to run first (`package` rebuilds the docs
//! before archiving them). The graph rejects cycles and yields execution
//! plans with dependencies ahead of dependents. Uses petgraph for graph
//! operations.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::{is_cyclic_directed, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use thiserror::Error;

/// A named build task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuildTask {
    Setup,
    Install,
    InstallDev,
    Install3,
    BuildDocs,
    Package,
    InstallDevtools,
    Pep8,
    Autopep8,
    Pylint,
}

impl BuildTask {
    /// Every task, in the order they are listed to users
    pub const ALL: [BuildTask; 10] = [
        BuildTask::Setup,
        BuildTask::Install,
        BuildTask::InstallDev,
        BuildTask::Install3,
        BuildTask::BuildDocs,
        BuildTask::Package,
        BuildTask::InstallDevtools,
        BuildTask::Pep8,
        BuildTask::Autopep8,
        BuildTask::Pylint,
    ];

    /// Command-line name of the task
    pub fn name(self) -> &'static str {
        match self {
            BuildTask::Setup => "setup",
            BuildTask::Install => "install",
            BuildTask::InstallDev => "installdev",
            BuildTask::Install3 => "install3",
            BuildTask::BuildDocs => "builddocs",
            BuildTask::Package => "package",
            BuildTask::InstallDevtools => "install-devtools",
            BuildTask::Pep8 => "pep8",
            BuildTask::Autopep8 => "autopep8",
            BuildTask::Pylint => "pylint",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BuildTask::Setup => "Install dependencies into the staging directory",
            BuildTask::Install => "Install the plugin into the QGIS 2 profile",
            BuildTask::InstallDev => "Install the plugin into the QGIS dev profile",
            BuildTask::Install3 => "Install the plugin into the QGIS 3 profile",
            BuildTask::BuildDocs => "Build the documentation",
            BuildTask::Package => "Create the plugin zip package",
            BuildTask::InstallDevtools => "Install development tools",
            BuildTask::Pep8 => "Check code for PEP8 violations",
            BuildTask::Autopep8 => "Format code according to PEP8",
            BuildTask::Pylint => "Check code for errors and coding standard violations",
        }
    }

    /// Tasks that must run before this one
    pub fn prerequisites(self) -> &'static [BuildTask] {
        match self {
            BuildTask::Package => &[BuildTask::BuildDocs],
            _ => &[],
        }
    }
}

impl fmt::Display for BuildTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Adding dependency would create a cycle: {0} -> {1}")]
    CycleDetected(BuildTask, BuildTask),

    #[error("Task not found: {0}")]
    TaskNotFound(BuildTask),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(BuildTask),
}

/// Dependency graph over build tasks
#[derive(Debug, Default)]
pub struct TaskGraph {
    /// Edges point from a prerequisite to the task that needs it
    graph: DiGraph<BuildTask, ()>,

    node_map: HashMap<BuildTask, NodeIndex>,
}

impl TaskGraph {
    /// Creates an empty graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds the graph of every known task and its prerequisites
    pub fn standard() -> Self {
        let mut graph = Self::new();

        for task in BuildTask::ALL {
            graph.add_task(task);
        }

        for task in BuildTask::ALL {
            for prerequisite in task.prerequisites() {
                if let Err(e) = graph.add_dependency(task, *prerequisite) {
                    tracing::error!(error = %e, "task catalogue rejected a prerequisite");
                }
            }
        }

        graph
    }

    /// Adds a task to the graph
    pub fn add_task(&mut self, task: BuildTask) {
        if !self.node_map.contains_key(&task) {
            let idx = self.graph.add_node(task);
            self.node_map.insert(task, idx);
        }
    }

    /// Adds a dependency edge: `task` needs `prerequisite` to run first
    pub fn add_dependency(
        &mut self,
        task: BuildTask,
        prerequisite: BuildTask,
    ) -> Result<(), GraphError> {
        if task == prerequisite {
            return Err(GraphError::SelfDependency(task));
        }

        let task_idx = self.index(task)?;
        let dep_idx = self.index(prerequisite)?;

        self.graph.add_edge(dep_idx, task_idx, ());

        if is_cyclic_directed(&self.graph) {
            if let Some(edge) = self.graph.find_edge(dep_idx, task_idx) {
                self.graph.remove_edge(edge);
            }
            return Err(GraphError::CycleDetected(task, prerequisite));
        }

        Ok(())
    }

    fn index(&self, task: BuildTask) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(&task)
            .copied()
            .ok_or(GraphError::TaskNotFound(task))
    }

    /// Returns the direct prerequisites of a task
    pub fn dependencies(&self, task: BuildTask) -> Vec<BuildTask> {
        let Some(idx) = self.node_map.get(&task) else {
            return vec![];
        };

        let mut deps: Vec<_> = self
            .graph
            .neighbors_directed(*idx, petgraph::Direction::Incoming)
            .filter_map(|i| self.graph.node_weight(i).copied())
            .collect();
        deps.sort();
        deps
    }

    /// Returns the tasks to run for `target`, prerequisites first
    ///
    /// The target itself is always last.
    pub fn execution_plan(&self, target: BuildTask) -> Result<Vec<BuildTask>, GraphError> {
        let target_idx = self.index(target)?;

        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, target_idx);
        let mut needed = HashSet::new();
        while let Some(idx) = dfs.next(reversed) {
            needed.insert(idx);
        }

        let order = toposort(&self.graph, None)
            .map_err(|cycle| GraphError::CycleDetected(target, self.graph[cycle.node_id()]))?;

        Ok(order
            .into_iter()
            .filter(|idx| needed.contains(idx))
            .map(|idx| self.graph[idx])
            .collect())
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task: BuildTask) -> bool {
        self.node_map.contains_key(&task)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
