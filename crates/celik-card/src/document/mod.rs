//! Decoded document records

pub mod id;
pub mod medical;
pub mod vehicle;

pub use id::{IdDocument, IdDocumentBuilder};
pub use medical::{Gender, MedicalDocument, MedicalDocumentBuilder};
pub use vehicle::VehicleDocument;

/// Document read from a card, one variant per document kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Id(IdDocument),
    Medical(MedicalDocument),
    Vehicle(VehicleDocument),
}

impl Document {
    /// Short human readable kind
    pub fn kind(&self) -> &'static str {
        match self {
            Document::Id(_) => "identity card",
            Document::Medical(_) => "medical insurance card",
            Document::Vehicle(_) => "vehicle registration card",
        }
    }
}

impl From<IdDocument> for Document {
    fn from(doc: IdDocument) -> Self {
        Document::Id(doc)
    }
}

impl From<MedicalDocument> for Document {
    fn from(doc: MedicalDocument) -> Self {
        Document::Medical(doc)
    }
}

impl From<VehicleDocument> for Document {
    fn from(doc: VehicleDocument) -> Self {
        Document::Vehicle(doc)
    }
}
