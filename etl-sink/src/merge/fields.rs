use std::fmt;

/// Reserved fields of a staged entry in an intermediate table.
///
/// These names form the schema shared with the merge that applies staged entries to the final
/// table, so they are only ever spelled through this enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IntermediateField {
    /// The converted record key. Never null.
    Key,
    /// The converted record value. Null if and only if the entry is a delete.
    Value,
    /// Position of the entry within the current batch of its destination.
    Iteration,
    /// Partition time of the entry, in seconds since the Unix epoch.
    PartitionTime,
}

impl IntermediateField {
    /// All reserved fields, in the order they are written to a staged entry.
    pub const ALL: [IntermediateField; 4] = [
        IntermediateField::Key,
        IntermediateField::Value,
        IntermediateField::Iteration,
        IntermediateField::PartitionTime,
    ];

    /// Returns the column name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            IntermediateField::Key => "key",
            IntermediateField::Value => "value",
            IntermediateField::Iteration => "i",
            IntermediateField::PartitionTime => "partitionTime",
        }
    }
}

impl fmt::Display for IntermediateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
