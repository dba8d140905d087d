//! Module discovery and ordering.
//!
//! Modules register themselves into a process-wide inventory via
//! `#[modkit::module(...)]`; the host binary calls [`discover`] once at startup
//! to collect them in dependency order, then drives each through the
//! `Module`/`RestfulModule`/`StatefulModule` contracts.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::contracts::{Module, RestfulModule, StatefulModule};

/// The capability trait objects a single module instance exposes, all pointing
/// at the same underlying allocation as `module`.
pub struct BuiltModule {
    pub name: &'static str,
    pub module: Arc<dyn Module>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

/// One entry per `#[modkit::module(...)]`-annotated type, submitted at link time.
pub struct ModuleRegistration {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub build: fn() -> BuiltModule,
}

inventory::collect!(ModuleRegistration);

/// Build every registered module and return them ordered so that each module
/// appears after every module named in its `deps`.
///
/// Returns an error if a declared dependency is not registered or a cycle exists.
pub fn discover() -> anyhow::Result<Vec<BuiltModule>> {
    let regs: Vec<&'static ModuleRegistration> = inventory::iter::<ModuleRegistration>().collect();

    let by_name: HashMap<&'static str, &'static ModuleRegistration> =
        regs.iter().map(|r| (r.name, *r)).collect();

    for reg in &regs {
        for dep in reg.deps {
            if !by_name.contains_key(dep) {
                anyhow::bail!(
                    "module '{}' declares unknown dependency '{}'",
                    reg.name,
                    dep
                );
            }
        }
    }

    let mut ordered_names = Vec::with_capacity(regs.len());
    let mut visited = HashSet::new();
    let mut visiting = HashSet::new();

    fn visit<'a>(
        reg: &'a ModuleRegistration,
        by_name: &HashMap<&'static str, &'a ModuleRegistration>,
        visited: &mut HashSet<&'static str>,
        visiting: &mut HashSet<&'static str>,
        ordered_names: &mut Vec<&'static str>,
    ) -> anyhow::Result<()> {
        if visited.contains(reg.name) {
            return Ok(());
        }
        if !visiting.insert(reg.name) {
            anyhow::bail!("dependency cycle detected at module '{}'", reg.name);
        }
        for dep in reg.deps {
            visit(by_name[dep], by_name, visited, visiting, ordered_names)?;
        }
        visiting.remove(reg.name);
        visited.insert(reg.name);
        ordered_names.push(reg.name);
        Ok(())
    }

    for reg in &regs {
        visit(reg, &by_name, &mut visited, &mut visiting, &mut ordered_names)?;
    }

    Ok(ordered_names
        .into_iter()
        .map(|name| (by_name[name].build)())
        .collect())
}
