//! Attention values and importance spreading.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::atom::AtomId;
use crate::storage::{AtomStore, StorageError};

/// Short-, long- and very-long-term importance of an atom.
///
/// No range is enforced; values are stored as given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttentionValue {
    /// Short-term importance.
    pub sti: i32,
    /// Long-term importance.
    pub lti: i32,
    /// Very-long-term importance.
    pub vlti: i32,
}

impl AttentionValue {
    /// Creates an attention value.
    #[must_use]
    pub const fn new(sti: i32, lti: i32, vlti: i32) -> Self {
        Self { sti, lti, vlti }
    }
}

impl fmt::Display for AttentionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[sti={}, lti={}, vlti={}]", self.sti, self.lti, self.vlti)
    }
}

/// How importance flows out of a source atom when it is spread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadMode {
    /// Every incoming link receives a share; the source keeps all of its STI.
    #[default]
    Broadcast,
    /// Shares handed out are debited from the source.
    Conservative,
}

/// Result of a single spreading step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpreadOutcome {
    /// Amount added to each receiving atom.
    pub share: i32,
    /// Atoms that received the share, in store enumeration order.
    pub recipients: Vec<AtomId>,
}

/// Spreads short-term importance from `source` to every link that references it.
///
/// With `sti <= 0`, or no incoming links, nothing moves and the outcome is
/// empty. Otherwise `share = sti / (incoming + 1)` (integer division) is added
/// to each incoming link. In [`SpreadMode::Conservative`] the source is debited
/// by `share * incoming`.
///
/// # Errors
///
/// `AtomNotFound` if `source` is not in the store.
pub fn spread_importance(
    store: &dyn AtomStore,
    source: AtomId,
    mode: SpreadMode,
) -> Result<SpreadOutcome, StorageError> {
    let atom = store.get(source)?.ok_or(StorageError::AtomNotFound(source))?;
    let sti = atom.sti();
    if sti <= 0 {
        return Ok(SpreadOutcome {
            share: 0,
            recipients: Vec::new(),
        });
    }

    let incoming = store.incoming(source)?;
    if incoming.is_empty() {
        return Ok(SpreadOutcome {
            share: 0,
            recipients: Vec::new(),
        });
    }

    let receivers = i32::try_from(incoming.len()).unwrap_or(i32::MAX);
    let share = sti / receivers.saturating_add(1);
    for link in &incoming {
        link.add_sti(share);
    }
    if mode == SpreadMode::Conservative {
        atom.add_sti(-share.saturating_mul(receivers));
    }

    tracing::trace!(source = %source, share, receivers, ?mode, "spread importance");

    Ok(SpreadOutcome {
        share,
        recipients: incoming.iter().map(|a| a.id()).collect(),
    })
}
