use serde_json::Value;

/// Index and document type a bulk operation addresses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexTarget {
	pub index: String,
	pub doc_type: String,
}
impl IndexTarget {
	pub fn new(index: impl Into<String>, doc_type: impl Into<String>) -> Self {
		Self { index: index.into(), doc_type: doc_type.into() }
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum BulkOperation {
	/// `id` is `None` when the record carries no id; the engine then assigns one.
	Index { target: IndexTarget, id: Option<String>, document: Value },
	Delete { target: IndexTarget, id: String },
}
impl BulkOperation {
	pub fn id(&self) -> Option<&str> {
		match self {
			Self::Index { id, .. } => id.as_deref(),
			Self::Delete { id, .. } => Some(id),
		}
	}

	pub fn header(&self) -> Value {
		let (op, target, id) = match self {
			Self::Index { target, id, .. } => ("index", target, id.as_deref()),
			Self::Delete { target, id } => ("delete", target, Some(id.as_str())),
		};
		let mut meta = serde_json::json!({ "_index": target.index, "_type": target.doc_type });

		if let (Some(id), Some(object)) = (id, meta.as_object_mut()) {
			object.insert("_id".to_string(), Value::String(id.to_string()));
		}

		serde_json::json!({ op: meta })
	}

	pub fn document(&self) -> Option<&Value> {
		match self {
			Self::Index { document, .. } => Some(document),
			Self::Delete { .. } => None,
		}
	}
}

/// Id of a source record, from its `id` field. Numbers are rendered in decimal.
pub fn record_id(record: &Value) -> Option<String> {
	match record.get("id")? {
		Value::String(id) if !id.is_empty() => Some(id.clone()),
		Value::Number(id) => Some(id.to_string()),
		_ => None,
	}
}

/// One `Index` operation per record, in record order.
pub fn index_batch(target: &IndexTarget, records: &[Value]) -> Vec<BulkOperation> {
	records
		.iter()
		.map(|record| BulkOperation::Index {
			target: target.clone(),
			id: record_id(record),
			document: record.clone(),
		})
		.collect()
}

/// One `Delete` operation per record. Records without an id cannot be addressed and are skipped.
pub fn delete_batch(target: &IndexTarget, records: &[Value]) -> Vec<BulkOperation> {
	records
		.iter()
		.filter_map(record_id)
		.map(|id| BulkOperation::Delete { target: target.clone(), id })
		.collect()
}

pub fn delete_one(target: &IndexTarget, id: &str) -> BulkOperation {
	BulkOperation::Delete { target: target.clone(), id: id.to_string() }
}

/// Flattens operations into the bulk body: each header, followed by its document for indexing.
pub fn to_entries(operations: &[BulkOperation]) -> Vec<Value> {
	let mut entries = Vec::with_capacity(operations.len() * 2);

	for operation in operations {
		entries.push(operation.header());

		if let Some(document) = operation.document() {
			entries.push(document.clone());
		}
	}

	entries
}
