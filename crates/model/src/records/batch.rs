use crate::records::record::Record;

/// Records handed over by the host for one flush, plus the tag they were routed by.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub tag: String,
    pub records: Vec<Record>,
}

impl Batch {
    pub fn new(tag: &str, records: Vec<Record>) -> Self {
        Batch {
            tag: tag.to_string(),
            records,
        }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }
}
