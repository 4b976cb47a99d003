use jotter_types::{Record, RecordId};

use crate::error::{StoreError, StoreResult};

/// An ordered sequence of records plus the counter that names new ones.
///
/// Records keep insertion order. Lookups are linear scans. Ids come from
/// `next_id`, which only ever moves forward, so an id is never handed out
/// twice even after deletes. Once `u64::MAX` has been assigned the counter is
/// spent and further creates fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection<T> {
    records: Vec<T>,
    next_id: Option<RecordId>,
}

impl<T: Record> Collection<T> {
    /// Create an empty collection whose first id will be 1.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: Some(RecordId::FIRST),
        }
    }

    /// Rebuild a collection from previously stored records.
    ///
    /// The counter resumes after the highest id present.
    pub fn from_records(records: Vec<T>) -> Self {
        let next_id = match records.iter().map(Record::id).max() {
            Some(max) => max.next(),
            None => Some(RecordId::FIRST),
        };
        Self { records, next_id }
    }

    pub fn list_all(&self) -> &[T] {
        &self.records
    }

    /// First record with the given id.
    pub fn get(&self, id: RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    /// Assign the next id to `draft`, append it, and return the stored record.
    pub fn create(&mut self, draft: T::Draft) -> StoreResult<T> {
        let id = self.next_id.ok_or(StoreError::IdsExhausted(T::KIND))?;
        self.next_id = id.next();
        let record = T::from_draft(id, draft);
        self.records.push(record.clone());
        Ok(record)
    }

    /// Replace the first record with `id` by `draft`, keeping the id.
    ///
    /// Returns `None` and leaves the collection untouched when nothing matches.
    pub fn update(&mut self, id: RecordId, draft: T::Draft) -> Option<T> {
        let slot = self.records.iter_mut().find(|r| r.id() == id)?;
        *slot = T::from_draft(id, draft);
        Some(slot.clone())
    }

    /// Remove the first record with `id`, preserving the order of the rest.
    pub fn delete(&mut self, id: RecordId) -> Option<T> {
        let index = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(index))
    }

    /// Clone every record matching `pred`, in order.
    pub fn filter<P>(&self, pred: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.records.iter().filter(|r| pred(r)).cloned().collect()
    }

    /// Remove every record matching `pred` and return them in their original order.
    pub fn remove_where<P>(&mut self, mut pred: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        let (removed, kept): (Vec<T>, Vec<T>) =
            std::mem::take(&mut self.records).into_iter().partition(|r| pred(r));
        self.records = kept;
        removed
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next `create` will assign, `None` once ids are spent.
    pub fn next_id(&self) -> Option<RecordId> {
        self.next_id
    }
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}
