//! Key and table naming for the three record families that share one store file.
//!
//! redb has flat named tables, so a nested namespace is a table whose name is the
//! root name followed by `/` and the child name. Visited and cookie records are
//! ASCII keys inside the root table; queue entries are fixed-width big-endian
//! sequence numbers inside `<bucket>/<prefix>:queue`.

use redb::TableDefinition;

/// Byte-keyed, byte-valued table used for the root namespace and the queue.
pub type BytesTable<'a> = TableDefinition<'a, &'static [u8], &'static [u8]>;

/// Per-namespace sequence counters, keyed by the nested namespace name.
pub type SequenceTable<'a> = TableDefinition<'a, &'static str, u64>;

/// Separator between a root namespace and its children.
pub const NAMESPACE_SEPARATOR: char = '/';

/// Presence marker stored for a visited fingerprint. Only its existence is read back.
pub const VISITED_MARKER: &[u8] = &[1];

const SEQUENCES_CHILD: &str = "sequences";

pub fn visited_key(prefix: &str, fingerprint: u64) -> Vec<u8> {
    format!("{}:request:{}", prefix, fingerprint).into_bytes()
}

pub fn cookie_key(prefix: &str, host: &str) -> Vec<u8> {
    format!("{}:cookie:{}", prefix, host).into_bytes()
}

pub fn queue_namespace(prefix: &str) -> String {
    format!("{}:queue", prefix)
}

/// Encode a sequence number so byte order equals numeric order.
pub fn encode_sequence(seq: u64) -> [u8; 8] {
    seq.to_be_bytes()
}

pub fn decode_sequence(bytes: &[u8]) -> Option<u64> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    Some(u64::from_be_bytes(raw))
}

/// Resolved table names for one (bucket, prefix) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    root: String,
    queue: String,
    queue_table: String,
    sequences: String,
}

impl TableNames {
    pub fn new(bucket: &str, prefix: &str) -> Self {
        let queue = queue_namespace(prefix);
        Self {
            root: bucket.to_string(),
            queue_table: nested_name(bucket, &queue),
            sequences: nested_name(bucket, SEQUENCES_CHILD),
            queue,
        }
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Name of the queue namespace relative to the root; also its sequence counter key.
    pub fn queue_name(&self) -> &str {
        &self.queue
    }

    pub fn queue_table_name(&self) -> &str {
        &self.queue_table
    }

    pub fn root(&self) -> BytesTable<'_> {
        TableDefinition::new(&self.root)
    }

    pub fn queue(&self) -> BytesTable<'_> {
        TableDefinition::new(&self.queue_table)
    }

    pub fn sequences(&self) -> SequenceTable<'_> {
        TableDefinition::new(&self.sequences)
    }

    /// True if a table with this name belongs to the root namespace (the root itself or any child).
    pub fn contains(&self, table_name: &str) -> bool {
        match table_name.strip_prefix(self.root.as_str()) {
            Some("") => true,
            Some(rest) => rest.starts_with(NAMESPACE_SEPARATOR),
            None => false,
        }
    }
}

fn nested_name(root: &str, child: &str) -> String {
    format!("{}{}{}", root, NAMESPACE_SEPARATOR, child)
}
