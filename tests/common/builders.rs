//! Test data builders for assembling structures without action plumbing

use strata_core::graph::{
    DataObject, DataStructure, Geometry, GeometryData, GroupData, StringArray,
};
use strata_core::{AnyStore, DataPath, ScalarType, ScalarValue};

/// Fluent builder for a [`DataStructure`] populated with test objects.
pub struct StructureBuilder {
    structure: DataStructure,
}

impl StructureBuilder {
    pub fn new() -> Self {
        Self {
            structure: DataStructure::new(),
        }
    }

    fn parse(path: &str) -> DataPath {
        path.parse().expect("builder path literal")
    }

    fn insert(mut self, path: &str, object: DataObject) -> Self {
        let path = Self::parse(path);
        let parent = path.parent().expect("builder path is not root");
        let name = path.name().expect("builder path has a name").to_string();
        self.structure
            .insert(name, object, &parent)
            .expect("builder insert");
        self
    }

    pub fn group(self, path: &str) -> Self {
        self.insert(path, DataObject::Group(GroupData::generic()))
    }

    pub fn attribute_matrix(self, path: &str, tuple_shape: Vec<usize>) -> Self {
        self.insert(path, DataObject::Group(GroupData::attribute_matrix(tuple_shape)))
    }

    pub fn image_geometry(self, path: &str, dimensions: [usize; 3]) -> Self {
        self.insert(
            path,
            DataObject::Geometry(GeometryData::new(Geometry::Image {
                dimensions,
                spacing: [1.0, 1.0, 1.0],
                origin: [0.0, 0.0, 0.0],
            })),
        )
    }

    /// A one-component f32 array holding `values`.
    pub fn f32_array(self, path: &str, values: &[f32]) -> Self {
        let mut store = AnyStore::new(ScalarType::F32, vec![values.len()], vec![1]);
        {
            let typed = store.as_f32_mut().expect("f32 store");
            for (tuple, &value) in values.iter().enumerate() {
                typed.set(tuple, 0, value).expect("in-bounds set");
            }
        }
        self.insert(path, DataObject::Array(store))
    }

    pub fn scalar(self, path: &str, value: ScalarValue) -> Self {
        self.insert(path, DataObject::Scalar(value))
    }

    pub fn strings(self, path: &str, values: &[&str]) -> Self {
        let values = values.iter().map(|s| s.to_string()).collect();
        self.insert(path, DataObject::StringArray(StringArray::from_values(values)))
    }

    pub fn build(self) -> DataStructure {
        self.structure
    }
}

impl Default for StructureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_builder() {
        let ds = StructureBuilder::new()
            .group("Scan")
            .f32_array("Scan/Confidence", &[0.5, 0.9])
            .build();
        let path: DataPath = "Scan/Confidence".parse().unwrap();
        assert_eq!(ds.array_at(&path).unwrap().num_tuples(), 2);
    }
}
