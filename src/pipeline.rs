//! Ordered transform hooks and the adapter registering the inline transform into them.

use std::borrow::Cow;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{InlineError, Result};
use crate::mode::EnvironmentMode;
use crate::transform::{AssetInlineTransform, TransformOutput, TransformRequest};

/// Name under which the inline transform is registered.
pub const INLINE_HOOK_NAME: &str = "inline-small-assets";

/// Hook the inline transform runs ahead of unless configured otherwise.
pub const DEFAULT_RUN_BEFORE: &str = "vite:asset";

/// Ordering constraints declared by a hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookOrder {
  /// Names of hooks this hook must run before.
  pub before: Vec<String>,
}

/// A per-file transform step in the pipeline.
#[async_trait]
pub trait TransformHook: Send + Sync {
  /// Stable name used for ordering and diagnostics.
  fn name(&self) -> Cow<'static, str>;

  /// Ordering constraints relative to other hooks.
  fn order(&self) -> HookOrder {
    HookOrder::default()
  }

  /// Transform `code` belonging to module `id`. `Ok(None)` leaves the code untouched.
  async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>>;
}

/// Collects hooks in registration order before ordering them.
#[derive(Default)]
pub struct PipelineBuilder {
  hooks: Vec<Arc<dyn TransformHook>>,
}

impl PipelineBuilder {
  /// Create an empty builder.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a hook.
  pub fn register(self, hook: impl TransformHook + 'static) -> Self {
    self.register_shared(Arc::new(hook))
  }

  /// Register an already shared hook.
  pub fn register_shared(mut self, hook: Arc<dyn TransformHook>) -> Self {
    self.hooks.push(hook);
    self
  }

  /// Order the hooks so every `before` constraint holds, keeping registration order otherwise.
  pub fn build(self) -> Result<TransformPipeline> {
    let names: Vec<String> = self.hooks.iter().map(|hook| hook.name().into_owned()).collect();
    let count = self.hooks.len();

    let mut successors: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); count];
    let mut indegree = vec![0usize; count];

    for (index, hook) in self.hooks.iter().enumerate() {
      for target in hook.order().before {
        let matches: Vec<usize> = names
          .iter()
          .enumerate()
          .filter(|(other, name)| *other != index && **name == target)
          .map(|(other, _)| other)
          .collect();

        if matches.is_empty() {
          debug!(hook = %names[index], before = %target, "ordering hint names no registered hook");
          continue;
        }

        for other in matches {
          if successors[index].insert(other) {
            indegree[other] += 1;
          }
        }
      }
    }

    let mut ready: BTreeSet<usize> = (0..count).filter(|index| indegree[*index] == 0).collect();
    let mut ordered = Vec::with_capacity(count);

    while let Some(index) = ready.pop_first() {
      ordered.push(index);
      for &next in &successors[index] {
        indegree[next] -= 1;
        if indegree[next] == 0 {
          ready.insert(next);
        }
      }
    }

    if ordered.len() != count {
      let stuck = cycle_member(&successors, &indegree)
        .map(|index| names[index].clone())
        .unwrap_or_default();
      return Err(InlineError::HookCycle(stuck));
    }

    let mut slots: Vec<Option<Arc<dyn TransformHook>>> = self.hooks.into_iter().map(Some).collect();
    let hooks = ordered
      .into_iter()
      .filter_map(|index| slots[index].take())
      .collect();

    Ok(TransformPipeline { hooks })
  }
}

/// Find a hook that sits on a cycle among those the sort could not place.
///
/// Every unplaced hook keeps at least one unplaced predecessor, so walking predecessors
/// `count` times from any of them must end inside a cycle rather than downstream of one.
fn cycle_member(successors: &[BTreeSet<usize>], indegree: &[usize]) -> Option<usize> {
  let stuck = |index: usize| indegree[index] > 0;
  let predecessor = |index: usize| {
    (0..successors.len()).find(|&other| stuck(other) && successors[other].contains(&index))
  };

  let mut current = (0..indegree.len()).find(|&index| stuck(index))?;
  for _ in 0..indegree.len() {
    current = predecessor(current)?;
  }
  Some(current)
}

/// Hooks in execution order.
pub struct TransformPipeline {
  hooks: Vec<Arc<dyn TransformHook>>,
}

impl TransformPipeline {
  /// Hook names in the order they run.
  pub fn hook_names(&self) -> Vec<String> {
    self.hooks.iter().map(|hook| hook.name().into_owned()).collect()
  }

  /// Run every hook over `code`. Returns the final code when any hook replaced it.
  pub async fn run(&self, code: &str, id: &str) -> Result<Option<String>> {
    let mut current: Option<String> = None;

    for hook in &self.hooks {
      let input = current.as_deref().unwrap_or(code);
      let outcome = hook.transform(input, id).await;
      match outcome {
        Ok(Some(output)) => {
          debug!(hook = %hook.name(), id, "hook replaced module code");
          current = Some(output.code);
        }
        Ok(None) => {}
        Err(err) => {
          return Err(InlineError::Hook {
            hook: hook.name().into_owned(),
            source: Box::new(err),
          });
        }
      }
    }

    Ok(current)
  }
}

/// [`AssetInlineTransform`] bound to a build mode, usable as a pipeline hook.
#[derive(Debug, Clone)]
pub struct InlineAssetHook {
  transform: AssetInlineTransform,
  mode: EnvironmentMode,
  run_before: Vec<String>,
}

impl InlineAssetHook {
  /// Wrap a transform for the given mode, ordered ahead of [`DEFAULT_RUN_BEFORE`].
  pub fn new(transform: AssetInlineTransform, mode: EnvironmentMode) -> Self {
    Self {
      transform,
      mode,
      run_before: vec![DEFAULT_RUN_BEFORE.to_string()],
    }
  }

  /// Replace the hooks this one runs before.
  pub fn with_run_before(mut self, run_before: Vec<String>) -> Self {
    self.run_before = run_before;
    self
  }
}

#[async_trait]
impl TransformHook for InlineAssetHook {
  fn name(&self) -> Cow<'static, str> {
    INLINE_HOOK_NAME.into()
  }

  fn order(&self) -> HookOrder {
    HookOrder {
      before: self.run_before.clone(),
    }
  }

  async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformOutput>> {
    let request = TransformRequest {
      path: Path::new(id),
      code,
      mode: &self.mode,
    };
    self.transform.transform(&request).await
  }
}
