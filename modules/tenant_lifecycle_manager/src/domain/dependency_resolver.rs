//! Pure computation over a module set: dependency/conflict closure checks and
//! install-plan simulation. No I/O, no async — the façade is the only caller.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};

use super::model::{InterfaceType, ModuleDescriptor, ModuleId, PlanAction, TenantModuleDescriptor};
use super::version::{self, interface_satisfies, module_name};

/// Structured result of a dependency/conflict check, stringified once at the
/// REST/façade boundary (empty string means "no failures").
#[derive(Debug, Default, Clone)]
pub struct DependencyFailure {
    pub unmet: Vec<String>,
    pub conflicting: Vec<String>,
}

impl DependencyFailure {
    pub fn is_empty(&self) -> bool {
        self.unmet.is_empty() && self.conflicting.is_empty()
    }

    pub fn to_message(&self) -> String {
        self.unmet.iter().chain(self.conflicting.iter()).cloned().collect::<Vec<_>>().join("; ")
    }
}

/// Returns the first unsatisfied requirement per module, if any.
pub fn check_dependencies(mods: &[&ModuleDescriptor]) -> Vec<String> {
    let mut failures = Vec::new();
    for m in mods {
        for req in &m.requires {
            let satisfied = mods.iter().any(|provider| {
                provider
                    .provides
                    .iter()
                    .any(|iface| iface.id == req.interface_id && interface_satisfies(&iface.version, &req.min_version))
            });
            if !satisfied {
                failures.push(format!(
                    "module '{}' missing dependency for {} {}",
                    m.id, req.interface_id, req.min_version
                ));
                break;
            }
        }
    }
    failures
}

/// Returns one message per interface id provided by more than one non-`multiple` module.
pub fn check_conflicts(mods: &[&ModuleDescriptor]) -> Vec<String> {
    let mut providers: HashMap<&str, Vec<&str>> = HashMap::new();
    for m in mods {
        for iface in &m.provides {
            if iface.interface_type != InterfaceType::Multiple {
                providers.entry(iface.id.as_str()).or_default().push(m.id.as_str());
            }
        }
    }
    let mut ids: Vec<&str> = providers.keys().copied().collect();
    ids.sort_unstable();
    ids.into_iter()
        .filter_map(|iface_id| {
            let holders = &providers[iface_id];
            (holders.len() > 1)
                .then(|| format!("interface '{iface_id}' provided by conflicting modules: {}", holders.join(", ")))
        })
        .collect()
}

pub fn check_all_dependencies(mods: &[&ModuleDescriptor]) -> String {
    check_dependencies(mods).join("; ")
}

pub fn check_all_conflicts(mods: &[&ModuleDescriptor]) -> String {
    check_conflicts(mods).join("; ")
}

pub fn check_closure(mods: &[&ModuleDescriptor]) -> DependencyFailure {
    DependencyFailure { unmet: check_dependencies(mods), conflicting: check_conflicts(mods) }
}

/// Expands a possibly-incomplete enable/disable plan so the resulting enabled set
/// is self-consistent: pulls in missing dependency providers for enables, cascades
/// disables to dependants, and marks anything unsatisfiable as `conflict`.
///
/// Idempotent: re-running over the function's own output with the same
/// `available`/`enabled` reproduces the same plan, since every decision is a pure
/// function of the module name already touched plus `available`/`enabled`.
pub fn install_simulate(
    available: &HashMap<ModuleId, ModuleDescriptor>,
    enabled: &HashMap<ModuleId, ModuleDescriptor>,
    plan: &[TenantModuleDescriptor],
) -> Vec<TenantModuleDescriptor> {
    let mut working: HashMap<String, ModuleId> =
        enabled.keys().map(|id| (module_name(id).to_owned(), id.clone())).collect();

    let mut output: Vec<TenantModuleDescriptor> = Vec::new();
    let mut decided: HashMap<String, usize> = HashMap::new();

    let mut queue: VecDeque<(ModuleId, PlanAction)> = plan
        .iter()
        .filter(|item| matches!(item.action, PlanAction::Enable | PlanAction::Disable))
        .map(|item| (item.id.clone(), item.action))
        .collect();

    while let Some((id, action)) = queue.pop_front() {
        let name = module_name(&id).to_owned();
        if decided.contains_key(&name) {
            continue;
        }

        match action {
            PlanAction::Enable => enable_one(available, &mut working, &mut output, &mut decided, &mut queue, id, name),
            PlanAction::Disable => {
                disable_one(available, &mut working, &mut output, &mut decided, &mut queue, id, name);
            }
            PlanAction::UpToDate | PlanAction::Conflict => {}
        }
    }

    topo_order(output, available)
}

#[allow(clippy::too_many_arguments)]
fn enable_one(
    available: &HashMap<ModuleId, ModuleDescriptor>,
    working: &mut HashMap<String, ModuleId>,
    output: &mut Vec<TenantModuleDescriptor>,
    decided: &mut HashMap<String, usize>,
    queue: &mut VecDeque<(ModuleId, PlanAction)>,
    id: ModuleId,
    name: String,
) {
    let Some(descriptor) = available.get(&id).cloned() else {
        decided.insert(name, output.len());
        output.push(TenantModuleDescriptor::conflict(id, None, "module not available"));
        return;
    };

    let from = working.get(&name).cloned();
    let already_current = from.as_deref() == Some(id.as_str());
    working.insert(name.clone(), id.clone());

    let item_action = if already_current { PlanAction::UpToDate } else { PlanAction::Enable };
    decided.insert(name.clone(), output.len());
    output.push(TenantModuleDescriptor::new(id.clone(), from, item_action));

    for req in &descriptor.requires {
        let satisfied = working.values().any(|enabled_id| {
            available.get(enabled_id).is_some_and(|d| {
                d.provides.iter().any(|iface| iface.id == req.interface_id && interface_satisfies(&iface.version, &req.min_version))
            })
        });
        if satisfied {
            continue;
        }
        match pick_provider(available, &req.interface_id, &req.min_version) {
            Some(provider_id) => queue.push_back((provider_id, PlanAction::Enable)),
            None => {
                let idx = decided[&name];
                let from = output[idx].from.clone();
                output[idx] =
                    TenantModuleDescriptor::conflict(id.clone(), from, format!("missing dependency for {} {}", req.interface_id, req.min_version));
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn disable_one(
    available: &HashMap<ModuleId, ModuleDescriptor>,
    working: &mut HashMap<String, ModuleId>,
    output: &mut Vec<TenantModuleDescriptor>,
    decided: &mut HashMap<String, usize>,
    queue: &mut VecDeque<(ModuleId, PlanAction)>,
    id: ModuleId,
    name: String,
) {
    let Some(current_id) = working.get(&name).cloned() else {
        decided.insert(name, output.len());
        output.push(TenantModuleDescriptor::new(id, None, PlanAction::Disable));
        return;
    };

    working.remove(&name);
    decided.insert(name, output.len());
    output.push(TenantModuleDescriptor::new(current_id.clone(), None, PlanAction::Disable));

    let Some(descriptor) = available.get(&current_id) else { return };
    let provided: Vec<&str> = descriptor.provides.iter().map(|p| p.id.as_str()).collect();

    for (dep_name, dep_id) in working.clone() {
        if decided.contains_key(&dep_name) {
            continue;
        }
        let Some(dep_descriptor) = available.get(&dep_id) else { continue };
        let depends_on_removed = dep_descriptor.requires.iter().any(|r| provided.contains(&r.interface_id.as_str()));
        if depends_on_removed {
            queue.push_back((dep_id, PlanAction::Disable));
        }
    }
}

/// Latest acceptable version, breaking ties by semver then by full id.
fn pick_provider(available: &HashMap<ModuleId, ModuleDescriptor>, interface_id: &str, min_version: &str) -> Option<ModuleId> {
    available
        .values()
        .filter(|d| d.provides.iter().any(|i| i.id == interface_id && interface_satisfies(&i.version, min_version)))
        .map(|d| d.id.clone())
        .max_by(|a, b| version::compare_module_ids(a, b).then_with(|| a.cmp(b)))
}

/// Orders items so an enable/uptodate item follows every module it depends on,
/// and a disable item precedes every module that depends on it.
fn topo_order(items: Vec<TenantModuleDescriptor>, available: &HashMap<ModuleId, ModuleDescriptor>) -> Vec<TenantModuleDescriptor> {
    let n = items.len();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];

    for (i, item) in items.iter().enumerate() {
        match item.action {
            PlanAction::Enable | PlanAction::UpToDate => {
                let Some(descriptor) = available.get(&item.id) else { continue };
                for req in &descriptor.requires {
                    for (j, other) in items.iter().enumerate() {
                        if j == i || !matches!(other.action, PlanAction::Enable | PlanAction::UpToDate) {
                            continue;
                        }
                        if available.get(&other.id).is_some_and(|d| d.provides.iter().any(|iface| iface.id == req.interface_id)) {
                            edges[j].push(i);
                            indegree[i] += 1;
                        }
                    }
                }
            }
            PlanAction::Disable => {
                let Some(descriptor) = available.get(&item.id) else { continue };
                let provided: Vec<&str> = descriptor.provides.iter().map(|p| p.id.as_str()).collect();
                for (j, other) in items.iter().enumerate() {
                    if j == i || other.action != PlanAction::Disable {
                        continue;
                    }
                    if available.get(&other.id).is_some_and(|d| d.requires.iter().any(|r| provided.contains(&r.interface_id.as_str()))) {
                        edges[i].push(j);
                        indegree[j] += 1;
                    }
                }
            }
            PlanAction::Conflict => {}
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n).filter(|&i| indegree[i] == 0).map(Reverse).collect();
    let mut remaining = indegree;
    let mut order = Vec::with_capacity(n);
    let mut seen = vec![false; n];

    while let Some(Reverse(i)) = ready.pop() {
        if seen[i] {
            continue;
        }
        seen[i] = true;
        order.push(i);
        for &j in &edges[i] {
            remaining[j] -= 1;
            if remaining[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }
    for i in 0..n {
        if !seen[i] {
            order.push(i);
        }
    }

    order.into_iter().map(|i| items[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{InterfaceDescriptor, InterfaceRequirement, RoutingEntry};

    fn provides(id: &str, name: &str, iface_id: &str, iface_version: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_owned(),
            name: name.to_owned(),
            provides: vec![InterfaceDescriptor {
                id: iface_id.to_owned(),
                version: iface_version.to_owned(),
                interface_type: InterfaceType::Proxy,
                routing_entries: vec![RoutingEntry { methods: vec!["GET".to_owned()], static_path: None, delay_milliseconds: None, unit: None }],
            }],
            requires: vec![],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        }
    }

    fn requiring(id: &str, name: &str, iface_id: &str, min_version: &str) -> ModuleDescriptor {
        ModuleDescriptor {
            id: id.to_owned(),
            name: name.to_owned(),
            provides: vec![],
            requires: vec![InterfaceRequirement { interface_id: iface_id.to_owned(), min_version: min_version.to_owned() }],
            optional: vec![],
            permission_sets: vec![],
            expanded_permission_sets: vec![],
        }
    }

    #[test]
    fn dependencies_satisfied_when_provider_present() {
        let users = provides("users-1.0.0", "users", "users", "1.0");
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let set = [&users, &mod_a];
        assert_eq!(check_all_dependencies(&set), "");
    }

    #[test]
    fn dependencies_report_missing_provider() {
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let set = [&mod_a];
        assert!(check_all_dependencies(&set).contains("missing dependency for users"));
    }

    #[test]
    fn conflicts_detected_for_duplicate_non_multiple_interface() {
        let users_a = provides("users-impl-a-1.0.0", "users-impl-a", "users", "1.0");
        let users_b = provides("users-impl-b-1.0.0", "users-impl-b", "users", "1.0");
        let set = [&users_a, &users_b];
        assert!(check_all_conflicts(&set).contains("conflicting modules"));
    }

    #[test]
    fn simulate_pulls_in_missing_dependency() {
        let users = provides("users-1.0.0", "users", "users", "1.0");
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let available: HashMap<ModuleId, ModuleDescriptor> =
            [(users.id.clone(), users.clone()), (mod_a.id.clone(), mod_a.clone())].into_iter().collect();
        let enabled = HashMap::new();
        let plan = vec![TenantModuleDescriptor::new(mod_a.id.clone(), None, PlanAction::Enable)];

        let result = install_simulate(&available, &enabled, &plan);
        assert_eq!(result.len(), 2);
        assert!(result.iter().any(|i| i.id == users.id && i.action == PlanAction::Enable));
        // `users` (the dependency) must come before `mod-A` (the dependant).
        let users_pos = result.iter().position(|i| i.id == users.id).unwrap();
        let mod_a_pos = result.iter().position(|i| i.id == mod_a.id).unwrap();
        assert!(users_pos < mod_a_pos);
    }

    #[test]
    fn simulate_marks_unsatisfiable_enable_as_conflict() {
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let available: HashMap<ModuleId, ModuleDescriptor> = [(mod_a.id.clone(), mod_a.clone())].into_iter().collect();
        let enabled = HashMap::new();
        let plan = vec![TenantModuleDescriptor::new(mod_a.id.clone(), None, PlanAction::Enable)];

        let result = install_simulate(&available, &enabled, &plan);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].action, PlanAction::Conflict);
    }

    #[test]
    fn simulate_is_idempotent() {
        let users = provides("users-1.0.0", "users", "users", "1.0");
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let available: HashMap<ModuleId, ModuleDescriptor> =
            [(users.id.clone(), users.clone()), (mod_a.id.clone(), mod_a.clone())].into_iter().collect();
        let enabled = HashMap::new();
        let plan = vec![TenantModuleDescriptor::new(mod_a.id.clone(), None, PlanAction::Enable)];

        let once = install_simulate(&available, &enabled, &plan);
        let twice = install_simulate(&available, &enabled, &once);
        assert_eq!(once, twice);
    }

    #[test]
    fn simulate_cascades_disable_to_dependants() {
        let users = provides("users-1.0.0", "users", "users", "1.0");
        let mod_a = requiring("mod-A-1.0.0", "mod-A", "users", "1.0");
        let available: HashMap<ModuleId, ModuleDescriptor> =
            [(users.id.clone(), users.clone()), (mod_a.id.clone(), mod_a.clone())].into_iter().collect();
        let enabled = available.clone();
        let plan = vec![TenantModuleDescriptor::new(users.id.clone(), None, PlanAction::Disable)];

        let result = install_simulate(&available, &enabled, &plan);
        assert_eq!(result.len(), 2);
        assert!(result.iter().any(|i| i.id == mod_a.id && i.action == PlanAction::Disable));
        let users_pos = result.iter().position(|i| i.id == users.id).unwrap();
        let mod_a_pos = result.iter().position(|i| i.id == mod_a.id).unwrap();
        assert!(users_pos < mod_a_pos);
    }
}
