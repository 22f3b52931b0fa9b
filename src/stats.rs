use fnv::FnvHashMap;

use crate::error::Error;
use crate::io::Interaction;
use crate::types::{self, SparseMatrix};

/// Maps the string identifiers of the training log to consecutive integer
/// indices and keeps basic statistics of the data. Community (item) names are
/// lower-cased before indexing, context ids are used verbatim.
pub struct DataDictionary {
    context_dict: FnvHashMap<String, u32>,
    item_dict: FnvHashMap<String, u32>,
    num_records: u64,
}

impl DataDictionary {
    pub fn num_contexts(&self) -> usize {
        self.context_dict.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_dict.len()
    }

    pub fn num_records(&self) -> u64 {
        self.num_records
    }

    pub fn context_index(&self, name: &str) -> Option<u32> {
        self.context_dict.get(name).copied()
    }

    pub fn item_index(&self, name: &str) -> Option<u32> {
        self.item_dict.get(&name.to_lowercase()).copied()
    }
}

impl<'a, I> From<I> for DataDictionary
where
    I: Iterator<Item = &'a Interaction>,
{
    fn from(records: I) -> Self {
        let mut context_index: u32 = 0;
        let mut context_dict: FnvHashMap<String, u32> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        let mut item_index: u32 = 0;
        let mut item_dict: FnvHashMap<String, u32> =
            FnvHashMap::with_capacity_and_hasher(100, Default::default());

        let mut num_records: u64 = 0;

        for record in records {
            if !context_dict.contains_key(&record.context) {
                context_dict.insert(record.context.clone(), context_index);
                context_index += 1;
            }

            let item = record.item.to_lowercase();
            if !item_dict.contains_key(&item) {
                item_dict.insert(item, item_index);
                item_index += 1;
            }

            num_records += 1;
        }

        DataDictionary {
            context_dict,
            item_dict,
            num_records,
        }
    }
}

/// Builds the sparse items×contexts count matrix from the log. Counts of
/// duplicate (item, context) pairs are summed. An empty log is a fatal
/// training condition, there is nothing to factorize.
pub fn interaction_matrix(
    records: &[Interaction],
    data_dict: &DataDictionary,
) -> Result<SparseMatrix, Error> {
    if records.is_empty() {
        return Err(Error::EmptyLog);
    }

    let mut matrix = types::new_sparse_matrix(data_dict.num_items());

    for record in records {
        let item = data_dict.item_index(&record.item);
        let context = data_dict.context_index(&record.context);

        if let (Some(item), Some(context)) = (item, context) {
            *matrix[item as usize].entry(context).or_insert(0.0) += record.count as f64;
        }
    }

    Ok(matrix)
}

/// Restores community names from item indices, in dense index order. Context
/// ids are not retained, nothing needs them after training.
pub struct Renaming {
    item_names: Vec<String>,
}

impl Renaming {
    pub fn item_name(&self, item_index: u32) -> &str {
        &self.item_names[item_index as usize]
    }

    pub fn into_names(self) -> Vec<String> {
        self.item_names
    }
}

impl From<DataDictionary> for Renaming {
    fn from(data_dict: DataDictionary) -> Self {
        let mut item_names = vec![String::new(); data_dict.item_dict.len()];

        for (item, item_index) in data_dict.item_dict.into_iter() {
            item_names[item_index as usize] = item;
        }

        Renaming { item_names }
    }
}
