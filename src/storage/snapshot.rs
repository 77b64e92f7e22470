//! Text snapshot format for atom stores.
//!
//! Format:
//! ```text
//! ATOMSPACE <version> <atom-count> <space-uuid> <exported-at rfc3339>
//! NODE <id> <kind> <strength> <confidence> <count> <sti> <lti> <vlti> <label-json>
//! LINK <id> <kind> <strength> <confidence> <count> <sti> <lti> <vlti> <arity> <id>...
//! END <blake3 hex of every preceding byte>
//! ```
//!
//! Every node is written before any link. Ids in the file are the exporting
//! store's ids; import assigns fresh ids and rewrites link references through
//! a remap table.
//!
//! Import reads and validates the whole document before touching the target
//! store, so a malformed snapshot never creates atoms. A failure from the
//! store itself part-way through creation (e.g. capacity) leaves the atoms
//! created so far in place.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::atom::{AtomId, AtomKind, AtomShape};
use crate::attention::AttentionValue;
use crate::storage::traits::{AtomStore, StorageError};
use crate::truth::TruthValue;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

const HEADER_TAG: &str = "ATOMSPACE";
const END_TAG: &str = "END";

/// Errors raised while exporting or importing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Reading or writing failed.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] io::Error),

    /// A line could not be parsed.
    #[error("Malformed snapshot at line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Unsupported format version.
    #[error("Unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// The checksum trailer does not match the content.
    #[error("Snapshot checksum mismatch: stored={stored} computed={computed}")]
    ChecksumMismatch {
        /// Checksum found in the trailer.
        stored: String,
        /// Checksum of the content read.
        computed: String,
    },

    /// The header count disagrees with the records present.
    #[error("Snapshot declares {declared} atoms but contains {actual}")]
    CountMismatch {
        /// Count in the header.
        declared: usize,
        /// Records found.
        actual: usize,
    },

    /// Links reference each other in a cycle and cannot be rebuilt.
    #[error("Snapshot links form a reference cycle involving {0}")]
    CyclicReference(AtomId),

    /// The target store failed.
    #[error("Snapshot storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Snapshot header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotHeader {
    /// Format version.
    pub version: u32,
    /// Number of atom records.
    pub atom_count: usize,
    /// Identity of the exporting store.
    pub space_id: Uuid,
    /// When the snapshot was written.
    pub exported_at: DateTime<Utc>,
}

/// Outcome of an import.
#[derive(Debug, Clone)]
pub struct ImportReport {
    /// Parsed header.
    pub header: SnapshotHeader,
    /// Serialized id -> id assigned by the target store.
    pub remap: HashMap<AtomId, AtomId>,
    /// Nodes created.
    pub nodes: usize,
    /// Links created.
    pub links: usize,
    /// Link references to atoms absent from the snapshot. They are mapped to
    /// reserved ids and stay dangling.
    pub dangling: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct AtomRecord {
    id: AtomId,
    kind: AtomKind,
    shape: AtomShape,
    truth: TruthValue,
    attention: AttentionValue,
}

struct HashingWriter<W: Write> {
    inner: W,
    hasher: blake3::Hasher,
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn write_values(out: &mut impl Write, tv: TruthValue, av: AttentionValue) -> io::Result<()> {
    write!(
        out,
        " {} {} {} {} {} {}",
        tv.strength, tv.confidence, tv.count, av.sti, av.lti, av.vlti
    )
}

/// Writes a snapshot of `store` to `writer`.
///
/// The atom list is taken in one scan; per-atom values are read right after
/// and may reflect concurrent updates made during the export.
///
/// Links that reference each other through forward references cannot be
/// rebuilt by import, so such a store is refused before anything is written.
///
/// # Errors
///
/// - `CyclicReference` if links form a reference cycle; nothing is written.
/// - `Io` if writing fails. Bytes already written stay in `writer`.
pub fn export_snapshot(
    store: &dyn AtomStore,
    space_id: Uuid,
    writer: &mut impl Write,
) -> Result<SnapshotHeader, SnapshotError> {
    let atoms = store.atoms()?;
    let edges: Vec<(AtomId, &[AtomId])> = atoms
        .iter()
        .filter(|a| a.is_link())
        .map(|a| (a.id(), a.outgoing()))
        .collect();
    link_creation_order(&edges)?;
    let header = SnapshotHeader {
        version: SNAPSHOT_VERSION,
        atom_count: atoms.len(),
        space_id,
        exported_at: Utc::now(),
    };

    let mut out = HashingWriter {
        inner: &mut *writer,
        hasher: blake3::Hasher::new(),
    };

    writeln!(
        out,
        "{HEADER_TAG} {} {} {} {}",
        header.version,
        header.atom_count,
        header.space_id,
        header.exported_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )?;

    for atom in atoms.iter().filter(|a| a.is_node()) {
        write!(out, "NODE {} {}", atom.id(), atom.kind())?;
        write_values(&mut out, atom.truth(), atom.attention())?;
        let label = serde_json::to_string(&atom.label()).map_err(io::Error::from)?;
        writeln!(out, " {label}")?;
    }

    for atom in atoms.iter().filter(|a| a.is_link()) {
        write!(out, "LINK {} {}", atom.id(), atom.kind())?;
        write_values(&mut out, atom.truth(), atom.attention())?;
        write!(out, " {}", atom.arity())?;
        for id in atom.outgoing() {
            write!(out, " {id}")?;
        }
        writeln!(out)?;
    }

    let digest = out.hasher.finalize();
    writeln!(writer, "{END_TAG} {}", digest.to_hex())?;
    writer.flush()?;

    tracing::info!(space = %space_id, atoms = header.atom_count, "snapshot exported");
    Ok(header)
}

/// Exports to `path` through a temporary file that is fsynced and renamed
/// into place, so readers never see a partial snapshot.
///
/// # Errors
///
/// `Io` on any file-system failure; the temporary file is removed.
pub fn export_to_path(
    store: &dyn AtomStore,
    space_id: Uuid,
    path: &Path,
) -> Result<SnapshotHeader, SnapshotError> {
    let temp_path = path.with_extension(format!("tmp.{}", Uuid::new_v4()));
    let result = write_and_rename(store, space_id, &temp_path, path);
    if result.is_err() && temp_path.exists() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_and_rename(
    store: &dyn AtomStore,
    space_id: Uuid,
    temp_path: &Path,
    path: &Path,
) -> Result<SnapshotHeader, SnapshotError> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)?;
    let mut writer = BufWriter::new(file);
    let header = export_snapshot(store, space_id, &mut writer)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    fs::rename(temp_path, path)?;
    Ok(header)
}

fn malformed(line: usize, reason: impl Into<String>) -> SnapshotError {
    SnapshotError::Malformed {
        line,
        reason: reason.into(),
    }
}

fn parse_field<T: std::str::FromStr>(
    token: Option<&str>,
    line: usize,
    field: &str,
) -> Result<T, SnapshotError>
where
    T::Err: std::fmt::Display,
{
    let token = token.ok_or_else(|| malformed(line, format!("missing {field}")))?;
    token
        .parse()
        .map_err(|e| malformed(line, format!("invalid {field} '{token}': {e}")))
}

fn parse_header(text: &str) -> Result<SnapshotHeader, SnapshotError> {
    let mut tokens = text.split_whitespace();
    if tokens.next() != Some(HEADER_TAG) {
        return Err(malformed(1, "missing ATOMSPACE header"));
    }
    let version: u32 = parse_field(tokens.next(), 1, "version")?;
    if version != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            expected: SNAPSHOT_VERSION,
        });
    }
    let atom_count = parse_field(tokens.next(), 1, "atom count")?;
    let space_id = parse_field(tokens.next(), 1, "space id")?;
    let exported_at = parse_field(tokens.next(), 1, "export time")?;
    Ok(SnapshotHeader {
        version,
        atom_count,
        space_id,
        exported_at,
    })
}

fn parse_values<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: usize,
) -> Result<(TruthValue, AttentionValue), SnapshotError> {
    let truth = TruthValue::new(
        parse_field(tokens.next(), line, "strength")?,
        parse_field(tokens.next(), line, "confidence")?,
        parse_field(tokens.next(), line, "count")?,
    );
    let attention = AttentionValue::new(
        parse_field(tokens.next(), line, "sti")?,
        parse_field(tokens.next(), line, "lti")?,
        parse_field(tokens.next(), line, "vlti")?,
    );
    Ok((truth, attention))
}

fn parse_node(text: &str, line: usize) -> Result<AtomRecord, SnapshotError> {
    // The label is JSON and may contain spaces, so split off exactly nine fields.
    let mut tokens = text.splitn(10, ' ');
    tokens.next();
    let id = AtomId::from_raw(parse_field(tokens.next(), line, "id")?);
    let kind = parse_field(tokens.next(), line, "kind")?;
    let (truth, attention) = parse_values(&mut tokens, line)?;
    let raw_label = tokens.next().ok_or_else(|| malformed(line, "missing label"))?;
    let label: Option<String> = serde_json::from_str(raw_label)
        .map_err(|e| malformed(line, format!("invalid label: {e}")))?;

    Ok(AtomRecord {
        id,
        kind,
        shape: AtomShape::Node { label },
        truth,
        attention,
    })
}

fn parse_link(text: &str, line: usize) -> Result<AtomRecord, SnapshotError> {
    let mut tokens = text.split_whitespace();
    tokens.next();
    let id = AtomId::from_raw(parse_field(tokens.next(), line, "id")?);
    let kind = parse_field(tokens.next(), line, "kind")?;
    let (truth, attention) = parse_values(&mut tokens, line)?;
    let arity: usize = parse_field(tokens.next(), line, "arity")?;
    let outgoing = tokens
        .map(|t| parse_field(Some(t), line, "outgoing id").map(AtomId::from_raw))
        .collect::<Result<Vec<_>, _>>()?;
    if outgoing.len() != arity {
        return Err(malformed(
            line,
            format!("arity {arity} but {} outgoing ids", outgoing.len()),
        ));
    }

    Ok(AtomRecord {
        id,
        kind,
        shape: AtomShape::Link { outgoing },
        truth,
        attention,
    })
}

fn parse_document(text: &str) -> Result<(SnapshotHeader, Vec<AtomRecord>), SnapshotError> {
    let trimmed = text.trim_end_matches('\n');
    let end_at = trimmed
        .rfind(&format!("\n{END_TAG} "))
        .ok_or_else(|| malformed(trimmed.lines().count().max(1), "missing END trailer"))?;
    let (body, trailer) = trimmed.split_at(end_at + 1);

    let stored = trailer[END_TAG.len()..].trim().to_string();
    let computed = blake3::hash(body.as_bytes()).to_hex().to_string();
    if stored != computed {
        return Err(SnapshotError::ChecksumMismatch { stored, computed });
    }

    let mut lines = body.lines();
    let header = parse_header(lines.next().unwrap_or_default())?;

    // The declared count is untrusted until checked against the records.
    let record_lines = body.lines().count().saturating_sub(1);
    let mut records = Vec::with_capacity(record_lines);
    let mut seen = HashSet::with_capacity(record_lines);
    let mut links_started = false;
    for (idx, text) in lines.enumerate() {
        let line = idx + 2;
        let record = match text.split(' ').next() {
            Some("NODE") if links_started => {
                return Err(malformed(line, "node record after link records"));
            }
            Some("NODE") => parse_node(text, line)?,
            Some("LINK") => {
                links_started = true;
                parse_link(text, line)?
            }
            _ => return Err(malformed(line, "expected NODE or LINK record")),
        };
        if !seen.insert(record.id) {
            return Err(malformed(line, format!("duplicate atom id {}", record.id)));
        }
        records.push(record);
    }

    if records.len() != header.atom_count {
        return Err(SnapshotError::CountMismatch {
            declared: header.atom_count,
            actual: records.len(),
        });
    }
    Ok((header, records))
}

/// Orders links so every link referenced by another link is created first.
/// Takes `(id, outgoing)` pairs and returns indexes into `links`.
fn link_creation_order(links: &[(AtomId, &[AtomId])]) -> Result<Vec<usize>, SnapshotError> {
    let link_ids: HashSet<AtomId> = links.iter().map(|(id, _)| *id).collect();
    let mut created: HashSet<AtomId> = HashSet::with_capacity(links.len());
    let mut pending: Vec<usize> = (0..links.len()).collect();
    let mut order = Vec::with_capacity(links.len());

    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|&i| {
            let (id, outgoing) = links[i];
            let ready = outgoing
                .iter()
                .all(|child| !link_ids.contains(child) || created.contains(child));
            if ready {
                created.insert(id);
                order.push(i);
            }
            !ready
        });
        if pending.len() == before {
            return Err(SnapshotError::CyclicReference(links[pending[0]].0));
        }
    }
    Ok(order)
}

/// Reads a snapshot from `reader` and recreates its atoms in `store`.
///
/// # Errors
///
/// - `Io`, `Malformed`, `ChecksumMismatch`, `CountMismatch`,
///   `UnsupportedVersion`, `CyclicReference`: nothing was created.
/// - `Storage`: the store refused an atom; earlier atoms remain.
pub fn import_snapshot(
    store: &dyn AtomStore,
    reader: &mut impl Read,
) -> Result<ImportReport, SnapshotError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let (header, records) = parse_document(&text)?;

    let (nodes, links): (Vec<&AtomRecord>, Vec<&AtomRecord>) =
        records.iter().partition(|r| matches!(r.shape, AtomShape::Node { .. }));
    let edges: Vec<(AtomId, &[AtomId])> = links
        .iter()
        .map(|r| match &r.shape {
            AtomShape::Link { outgoing } => (r.id, outgoing.as_slice()),
            AtomShape::Node { .. } => (r.id, &[][..]),
        })
        .collect();
    let order = link_creation_order(&edges)?;

    let known: HashSet<AtomId> = records.iter().map(|r| r.id).collect();
    let mut remap: HashMap<AtomId, AtomId> = HashMap::with_capacity(records.len());

    for record in &nodes {
        let label = match &record.shape {
            AtomShape::Node { label } => label.as_deref(),
            AtomShape::Link { .. } => None,
        };
        let atom = store.create_node(record.kind, label)?;
        atom.set_truth(record.truth);
        atom.set_attention(record.attention);
        remap.insert(record.id, atom.id());
    }

    let mut dangling = 0;
    for i in order {
        let record = links[i];
        let AtomShape::Link { outgoing } = &record.shape else {
            continue;
        };
        let mut mapped = Vec::with_capacity(outgoing.len());
        for id in outgoing {
            let target = match remap.get(id) {
                Some(target) => *target,
                None if !known.contains(id) => {
                    let reserved = store.reserve_id()?;
                    remap.insert(*id, reserved);
                    dangling += 1;
                    reserved
                }
                None => return Err(SnapshotError::CyclicReference(record.id)),
            };
            mapped.push(target);
        }
        let atom = store.create_link(record.kind, mapped)?;
        atom.set_truth(record.truth);
        atom.set_attention(record.attention);
        remap.insert(record.id, atom.id());
    }

    // Reserved ids are bookkeeping only; report just the atoms that exist.
    remap.retain(|from, _| known.contains(from));

    tracing::info!(
        source = %header.space_id,
        nodes = nodes.len(),
        links = links.len(),
        dangling,
        "snapshot imported"
    );

    Ok(ImportReport {
        header,
        remap,
        nodes: nodes.len(),
        links: links.len(),
        dangling,
    })
}

/// Imports a snapshot file written by [`export_to_path`].
///
/// # Errors
///
/// See [`import_snapshot`].
pub fn import_from_path(store: &dyn AtomStore, path: &Path) -> Result<ImportReport, SnapshotError> {
    let mut file = File::open(path)?;
    import_snapshot(store, &mut file)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use crate::storage::AtomSpace;

    fn sample() -> AtomSpace {
        let space = AtomSpace::new();
        let cat = space.create_node(AtomKind::Concept, Some("big cat")).unwrap();
        let animal = space.create_node(AtomKind::Concept, Some("animal")).unwrap();
        let blank = space.create_node(AtomKind::Node, None).unwrap();
        let isa = space
            .create_link(AtomKind::Inheritance, vec![cat.id(), animal.id()])
            .unwrap();
        isa.set_truth(TruthValue::new(0.9, 0.8, 12));
        isa.set_attention(AttentionValue::new(40, -3, 1));
        space
            .create_link(AtomKind::List, vec![isa.id(), blank.id(), cat.id()])
            .unwrap();
        space.create_link(AtomKind::List, Vec::new()).unwrap();
        space
    }

    fn export_string(space: &AtomSpace) -> String {
        let mut buf = Vec::new();
        export_snapshot(space, space.space_id(), &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn nodes_are_written_before_links() {
        let text = export_string(&sample());
        let kinds: Vec<&str> = text.lines().map(|l| l.split(' ').next().unwrap()).collect();
        assert_eq!(kinds, vec!["ATOMSPACE", "NODE", "NODE", "NODE", "LINK", "LINK", "LINK", "END"]);
        assert!(text.contains("\"big cat\""));
        assert!(text.contains(" null\n"));
    }

    #[test]
    fn import_remaps_ids_and_preserves_values() {
        let source = sample();
        let text = export_string(&source);

        let target = AtomSpace::new();
        // Shift ids so the remap is not the identity.
        target.create_node(AtomKind::Concept, Some("pre-existing")).unwrap();
        let report = import_snapshot(&target, &mut Cursor::new(text)).unwrap();

        assert_eq!(report.nodes, 3);
        assert_eq!(report.links, 3);
        assert_eq!(report.dangling, 0);
        assert_eq!(target.len().unwrap(), 7);

        for original in source.atoms().unwrap() {
            let copy = target.get(report.remap[&original.id()]).unwrap().unwrap();
            assert_ne!(copy.id(), original.id());
            assert_eq!(copy.kind(), original.kind());
            assert_eq!(copy.label(), original.label());
            assert_eq!(copy.truth(), original.truth());
            assert_eq!(copy.attention(), original.attention());
            let mapped: Vec<AtomId> = original.outgoing().iter().map(|id| report.remap[id]).collect();
            assert_eq!(copy.outgoing(), mapped.as_slice());
        }
    }

    #[test]
    fn forward_referencing_links_are_rebuilt_in_dependency_order() {
        let space = AtomSpace::new();
        let a = space.create_node(AtomKind::Concept, Some("a")).unwrap();
        // Link 2 points at link 3, which does not exist yet.
        let outer = space
            .create_link(AtomKind::List, vec![a.id(), AtomId::from_raw(3)])
            .unwrap();
        let inner = space.create_link(AtomKind::List, vec![a.id()]).unwrap();
        assert_eq!(inner.id(), AtomId::from_raw(3));

        let target = AtomSpace::new();
        let report = import_snapshot(&target, &mut Cursor::new(export_string(&space))).unwrap();
        let outer_copy = target.get(report.remap[&outer.id()]).unwrap().unwrap();
        assert_eq!(outer_copy.outgoing()[1], report.remap[&inner.id()]);
        assert!(target.contains(outer_copy.outgoing()[1]).unwrap());
    }

    #[test]
    fn dangling_references_stay_dangling() {
        let space = AtomSpace::new();
        let a = space.create_node(AtomKind::Concept, Some("a")).unwrap();
        let b = space.create_node(AtomKind::Concept, Some("b")).unwrap();
        let ab = space
            .create_link(AtomKind::Inheritance, vec![a.id(), b.id()])
            .unwrap();
        space.delete(b.id()).unwrap();

        let target = AtomSpace::new();
        let report = import_snapshot(&target, &mut Cursor::new(export_string(&space))).unwrap();
        assert_eq!(report.dangling, 1);
        let copy = target.get(report.remap[&ab.id()]).unwrap().unwrap();
        let resolved = target.resolve_outgoing(&copy).unwrap();
        assert!(resolved[0].is_some());
        assert!(resolved[1].is_none());
    }

    #[test]
    fn tampered_snapshot_is_rejected_without_side_effects() {
        let text = export_string(&sample()).replacen("animal", "animus", 1);
        let target = AtomSpace::new();
        let err = import_snapshot(&target, &mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SnapshotError::ChecksumMismatch { .. }));
        assert!(target.is_empty().unwrap());
    }

    #[test]
    fn missing_trailer_and_bad_header_are_malformed() {
        let target = AtomSpace::new();
        let err = import_snapshot(&target, &mut Cursor::new("ATOMSPACE 1 0\n")).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { .. }));

        let body = "GARBAGE\n";
        let text = format!("{body}END {}\n", blake3::hash(body.as_bytes()).to_hex());
        let err = import_snapshot(&target, &mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed { line: 1, .. }));
    }

    #[test]
    fn count_mismatch_is_detected() {
        let body = format!(
            "ATOMSPACE 1 2 {} 2026-01-01T00:00:00Z\nNODE 1 ConceptNode 0.5 0 0 0 0 0 \"x\"\n",
            Uuid::nil()
        );
        let text = format!("{body}END {}\n", blake3::hash(body.as_bytes()).to_hex());
        let err = import_snapshot(&AtomSpace::new(), &mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SnapshotError::CountMismatch { declared: 2, actual: 1 }));
    }

    #[test]
    fn oversized_declared_count_is_a_count_mismatch() {
        let declared = usize::MAX / 4;
        let body = format!("ATOMSPACE 1 {declared} {} 2026-01-01T00:00:00Z\n", Uuid::nil());
        let text = format!("{body}END {}\n", blake3::hash(body.as_bytes()).to_hex());
        let target = AtomSpace::new();
        let err = import_snapshot(&target, &mut Cursor::new(text)).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::CountMismatch { declared: d, actual: 0 } if d == declared
        ));
        assert!(target.is_empty().unwrap());
    }

    #[test]
    fn link_cycles_are_rejected() {
        let body = format!(
            "ATOMSPACE 1 2 {} 2026-01-01T00:00:00Z\n\
             LINK 1 ListLink 0.5 0 0 0 0 0 1 2\n\
             LINK 2 ListLink 0.5 0 0 0 0 0 1 1\n",
            Uuid::nil()
        );
        let text = format!("{body}END {}\n", blake3::hash(body.as_bytes()).to_hex());
        let target = AtomSpace::new();
        let err = import_snapshot(&target, &mut Cursor::new(text)).unwrap_err();
        assert!(matches!(err, SnapshotError::CyclicReference(_)));
        assert!(target.is_empty().unwrap());
    }

    #[test]
    fn mutually_referencing_links_are_refused_at_export() {
        let space = AtomSpace::new();
        let a = space.create_node(AtomKind::Concept, Some("a")).unwrap();
        // Ids 2 and 3 point at each other.
        space
            .create_link(AtomKind::List, vec![a.id(), AtomId::from_raw(3)])
            .unwrap();
        space
            .create_link(AtomKind::List, vec![a.id(), AtomId::from_raw(2)])
            .unwrap();

        let mut buf = Vec::new();
        let err = export_snapshot(&space, space.space_id(), &mut buf).unwrap_err();
        assert!(matches!(err, SnapshotError::CyclicReference(_)));
        assert!(buf.is_empty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cyclic.snapshot");
        let err = export_to_path(&space, space.space_id(), &path).unwrap_err();
        assert!(matches!(err, SnapshotError::CyclicReference(_)));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn file_export_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("space.snapshot");
        let source = sample();

        let header = export_to_path(&source, source.space_id(), &path).unwrap();
        assert_eq!(header.atom_count, 6);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name() != "space.snapshot")
            .collect();
        assert!(leftovers.is_empty());

        let target = AtomSpace::new();
        let report = import_from_path(&target, &path).unwrap();
        assert_eq!(report.header.space_id, source.space_id());
        assert_eq!(target.len().unwrap(), 6);
    }
}
