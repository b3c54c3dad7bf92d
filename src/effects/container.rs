use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::battle::combatant::CombatantId;
use crate::battle::state::Battle;
use crate::effects::record::{EffectCategory, EffectData, EffectId, EffectLock, EffectOwner, EffectRecord, EffectState};
use crate::effects::registry::EffectPrototype;
use crate::errors::{BattleResult, EffectError};

/// Ordered handles of the records attached to one owner, plus a name index.
#[derive(Debug, Clone, Default)]
pub struct EffectContainer {
    order: Vec<EffectId>,
    index: HashMap<&'static str, Vec<EffectId>>,
}

impl EffectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles in attachment order.
    pub fn ids(&self) -> &[EffectId] {
        &self.order
    }

    pub fn ids_named(&self, name: &str) -> &[EffectId] {
        self.index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn insert(&mut self, id: EffectId, name: &'static str) {
        self.order.push(id);
        self.index.entry(name).or_default().push(id);
    }

    fn remove(&mut self, id: EffectId, name: &'static str) {
        self.order.retain(|e| *e != id);
        if let Some(ids) = self.index.get_mut(name) {
            ids.retain(|e| *e != id);
            if ids.is_empty() {
                self.index.remove(name);
            }
        }
    }
}

/// Result of an attach request. Everything but `Applied` is an ordinary game
/// outcome ("But it failed!"), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Applied(EffectId),
    /// A status transform dropped the incoming effect
    Blocked,
    /// The owner already carries an effect of the same lock or identity
    Conflict,
    /// The effect's own apply hook declined
    Rejected,
}

impl AttachOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, AttachOutcome::Applied(_))
    }

    pub fn id(self) -> Option<EffectId> {
        match self {
            AttachOutcome::Applied(id) => Some(id),
            _ => None,
        }
    }
}

impl Battle {
    pub fn effect(&self, id: EffectId) -> Option<&EffectRecord> {
        self.effects.get(id.0).and_then(Option::as_ref)
    }

    pub fn effect_mut(&mut self, id: EffectId) -> Option<&mut EffectRecord> {
        self.effects.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Like `effect`, for hooks that must have a live record.
    pub fn record(&self, id: EffectId) -> BattleResult<&EffectRecord> {
        self.effect(id).ok_or_else(|| EffectError::StaleHandle(id).into())
    }

    pub fn record_mut(&mut self, id: EffectId) -> BattleResult<&mut EffectRecord> {
        self.effect_mut(id).ok_or_else(|| EffectError::StaleHandle(id).into())
    }

    /// Combatant the record is attached to, `None` for field effects.
    pub fn subject_of(&self, id: EffectId) -> Option<CombatantId> {
        self.effect(id).and_then(EffectRecord::subject)
    }

    /// Like `subject_of`, for hooks that only make sense on a combatant.
    pub fn require_subject(&self, id: EffectId) -> BattleResult<CombatantId> {
        let record = self.record(id)?;
        record
            .subject()
            .ok_or_else(|| EffectError::RequiresCombatant(record.name().to_string()).into())
    }

    pub fn container(&self, owner: EffectOwner) -> &EffectContainer {
        match owner {
            EffectOwner::Combatant(id) => &self.combatants[id.0].container,
            EffectOwner::Field => &self.field,
        }
    }

    fn container_mut(&mut self, owner: EffectOwner) -> &mut EffectContainer {
        match owner {
            EffectOwner::Combatant(id) => &mut self.combatants[id.0].container,
            EffectOwner::Field => &mut self.field,
        }
    }

    /// First live record named `name` on `owner`.
    pub fn find(&self, owner: EffectOwner, name: &str) -> Option<EffectId> {
        self.container(owner)
            .ids_named(name)
            .iter()
            .copied()
            .find(|id| self.effect(*id).is_some_and(|r| !r.is_removable()))
    }

    /// Live records of `category` on `owner`, in attachment order.
    pub fn find_category(&self, owner: EffectOwner, category: EffectCategory) -> Vec<EffectId> {
        self.container(owner)
            .ids()
            .iter()
            .copied()
            .filter(|id| self.effect(*id).is_some_and(|r| !r.is_removable() && r.category() == category))
            .collect()
    }

    /// Live record holding `lock` on `owner`.
    pub fn find_lock(&self, owner: EffectOwner, lock: EffectLock) -> Option<EffectId> {
        self.container(owner)
            .ids()
            .iter()
            .copied()
            .find(|id| self.effect(*id).is_some_and(|r| !r.is_removable() && r.behavior.lock == lock))
    }

    pub fn attach(
        &mut self,
        owner: EffectOwner,
        prototype: EffectPrototype,
        inducer: Option<CombatantId>,
    ) -> BattleResult<AttachOutcome> {
        self.attach_with(owner, prototype, inducer, EffectData::default())
    }

    /// Attaches a new record built from `prototype` and seeded with `data`.
    ///
    /// Incoming effects on a combatant first pass through every active
    /// transform-status hook, which may rewrite or drop them. Only the
    /// surviving prototype is checked for coexistence and applied.
    pub fn attach_with(
        &mut self,
        owner: EffectOwner,
        prototype: EffectPrototype,
        inducer: Option<CombatantId>,
        data: EffectData,
    ) -> BattleResult<AttachOutcome> {
        let prototype = match owner {
            EffectOwner::Combatant(subject) => match self.transform_status(subject, inducer, prototype) {
                Some(prototype) => prototype,
                None => {
                    debug!(?owner, "attach blocked by status transform");
                    return Ok(AttachOutcome::Blocked);
                }
            },
            EffectOwner::Field => prototype,
        };

        if self.conflicts(owner, &prototype) {
            debug!(?owner, effect = prototype.name, "attach conflicts with an existing effect");
            return Ok(AttachOutcome::Conflict);
        }

        let id = EffectId(self.effects.len());
        self.next_seq += 1;
        let apply = prototype.apply;
        self.effects.push(Some(EffectRecord {
            id,
            behavior: Arc::clone(&prototype),
            owner,
            inducer,
            state: EffectState::Active,
            seq: self.next_seq,
            data,
        }));

        let accepted = match apply {
            Some(f) => f(self, id),
            None => Ok(true),
        };
        match accepted {
            Ok(true) => {
                self.container_mut(owner).insert(id, prototype.name);
                debug!(?owner, effect = prototype.name, ?id, "effect attached");
                Ok(AttachOutcome::Applied(id))
            }
            Ok(false) => {
                self.effects[id.0] = None;
                debug!(?owner, effect = prototype.name, "apply hook rejected effect");
                Ok(AttachOutcome::Rejected)
            }
            Err(err) => {
                self.effects[id.0] = None;
                Err(err)
            }
        }
    }

    fn conflicts(&self, owner: EffectOwner, prototype: &EffectPrototype) -> bool {
        self.container(owner).ids().iter().filter_map(|id| self.effect(*id)).any(|r| {
            if r.is_removable() {
                return false;
            }
            let locked = prototype.lock != EffectLock::None && r.behavior.lock == prototype.lock;
            let duplicate =
                prototype.singleton && r.name() == prototype.name && r.category() == prototype.category;
            locked || duplicate
        })
    }

    /// Marks the record removable and runs its unapply hook. Returns `false`
    /// when the record was already detached. The record itself is dropped
    /// once no dispatch pass is running.
    pub fn detach(&mut self, id: EffectId) -> BattleResult<bool> {
        let Some(record) = self.effect_mut(id) else {
            return Ok(false);
        };
        if record.is_removable() {
            return Ok(false);
        }
        record.state = EffectState::Removable;
        let name = record.name();
        let unapply = record.behavior.unapply;
        debug!(effect = name, ?id, "effect detached");
        if let Some(f) = unapply {
            f(self, id)?;
        }
        if self.dispatch_depth == 0 {
            self.sweep();
        }
        Ok(true)
    }

    /// Drops every removable record from its container and the arena.
    pub fn sweep(&mut self) {
        let removable: Vec<(EffectId, EffectOwner, &'static str)> = self
            .effects
            .iter()
            .flatten()
            .filter(|r| r.is_removable())
            .map(|r| (r.id, r.owner, r.name()))
            .collect();
        for (id, owner, name) in removable {
            self.container_mut(owner).remove(id, name);
            self.effects[id.0] = None;
        }
    }

    /// Detaches every live record named `name` on `owner`.
    pub fn detach_named(&mut self, owner: EffectOwner, name: &str) -> BattleResult<bool> {
        let ids: Vec<EffectId> = self.container(owner).ids_named(name).to_vec();
        let mut removed = false;
        for id in ids {
            removed |= self.detach(id)?;
        }
        Ok(removed)
    }
}
