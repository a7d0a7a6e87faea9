use std::collections::{BTreeMap, BTreeSet};

use dromos_types::{AddressTable, UnitDescriptor, UnitName};

use crate::PlanError;

/// A validated, totally ordered deployment plan.
///
/// Built from a set of unit descriptors and an optional seed table of
/// pre-deployed addresses. The order guarantees that every construction-time
/// reference (constructor argument, link slot, explicit depends-on edge)
/// points at a unit placed earlier, or at a seed entry. Units with no
/// relative dependency keep their declaration order, so the same input
/// always produces the same plan.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    units: Vec<UnitDescriptor>,
}

impl ExecutionPlan {
    pub fn build(units: Vec<UnitDescriptor>, seed: &AddressTable) -> Result<Self, PlanError> {
        let count = units.len();

        let mut index: BTreeMap<&UnitName, usize> = BTreeMap::new();
        for (i, unit) in units.iter().enumerate() {
            if index.insert(&unit.name, i).is_some() {
                return Err(PlanError::DuplicateUnit(unit.name.clone()));
            }
        }

        // Validate every reference before ordering. Post-deploy references
        // resolve against the complete table later, so they are checked here
        // but contribute no edges.
        let mut deps: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, unit) in units.iter().enumerate() {
            for reference in unit.all_refs() {
                if reference == &unit.name {
                    return Err(PlanError::CycleDetected {
                        members: vec![unit.name.clone()],
                    });
                }
                if !index.contains_key(reference) && !seed.contains(reference) {
                    return Err(PlanError::UnresolvedReference {
                        unit: unit.name.clone(),
                        reference: reference.clone(),
                    });
                }
            }
            for reference in unit.construction_refs() {
                if let Some(&target) = index.get(reference) {
                    if !deps[i].contains(&target) {
                        deps[i].push(target);
                    }
                }
            }
        }

        // Kahn's algorithm with a BTreeSet ready pool: the smallest
        // declaration index always leaves first, which pins tie order.
        let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, targets) in deps.iter().enumerate() {
            for &target in targets {
                dependents[target].push(i);
            }
        }

        let mut ready: BTreeSet<usize> =
            (0..count).filter(|&i| pending[i] == 0).collect();
        let mut order: Vec<usize> = Vec::with_capacity(count);

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < count {
            let remaining: BTreeSet<usize> =
                (0..count).filter(|&i| pending[i] > 0).collect();
            let cycle = find_cycle(&remaining, &deps);
            return Err(PlanError::CycleDetected {
                members: cycle
                    .into_iter()
                    .map(|i| units[i].name.clone())
                    .collect(),
            });
        }

        let by_position: Vec<UnitDescriptor> = {
            let mut slots: Vec<Option<UnitDescriptor>> =
                units.into_iter().map(Some).collect();
            order
                .iter()
                .map(|&i| slots[i].take().expect("each index ordered once"))
                .collect()
        };

        tracing::debug!(
            units = by_position.len(),
            order = ?by_position.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            "Execution plan resolved"
        );

        Ok(Self { units: by_position })
    }

    pub fn units(&self) -> &[UnitDescriptor] {
        &self.units
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnitDescriptor> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Position of a unit in the plan, if present.
    pub fn position(&self, name: &UnitName) -> Option<usize> {
        self.units.iter().position(|u| &u.name == name)
    }
}

/// Walk dependency edges among the unordered remainder until a node repeats;
/// the repeated suffix is a genuine cycle.
fn find_cycle(remaining: &BTreeSet<usize>, deps: &[Vec<usize>]) -> Vec<usize> {
    let start = *remaining.iter().next().expect("cycle implies leftovers");
    let mut seen_at: BTreeMap<usize, usize> = BTreeMap::new();
    let mut path: Vec<usize> = Vec::new();
    let mut current = start;

    loop {
        if let Some(&position) = seen_at.get(&current) {
            return path[position..].to_vec();
        }
        seen_at.insert(current, path.len());
        path.push(current);
        current = *deps[current]
            .iter()
            .find(|d| remaining.contains(d))
            .expect("unordered unit keeps an unordered dependency");
    }
}
