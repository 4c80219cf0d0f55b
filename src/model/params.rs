//! Named parameters and their host-side mirror.

use crate::backend::{Backend, Device, Tensor1D};
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// One learnable tensor.
///
/// Values are stored flat; `shape` records the logical layout so a state
/// dict can be checked against the architecture that reads it back.
#[derive(Clone, Debug)]
pub struct Param<B: Backend> {
    value: Tensor1D<B>,
    shape: Vec<usize>,
    trainable: bool,
}

impl<B: Backend> Param<B> {
    /// A trainable vector parameter of shape `[len]`.
    pub fn new(value: Tensor1D<B>) -> Self {
        let shape = vec![value.len()];
        Self {
            value,
            shape,
            trainable: true,
        }
    }

    /// A trainable parameter with an explicit logical shape.
    ///
    /// # Errors
    /// [`ModelError::ShapeMismatch`] if the element count disagrees with `shape`.
    pub fn with_shape(value: Tensor1D<B>, shape: Vec<usize>) -> Result<Self, ModelError> {
        let numel: usize = shape.iter().product();
        if numel != value.len() {
            return Err(ModelError::ShapeMismatch {
                name: "<param>".to_string(),
                expected: shape,
                got: vec![value.len()],
            });
        }
        Ok(Self {
            value,
            shape,
            trainable: true,
        })
    }

    /// Marks the parameter as frozen: optimizers skip it and
    /// [`ParamStore::trainable_numel`] ignores it.
    pub fn frozen(mut self) -> Self {
        self.trainable = false;
        self
    }

    pub fn value(&self) -> &Tensor1D<B> {
        &self.value
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn is_trainable(&self) -> bool {
        self.trainable
    }

    pub fn set_trainable(&mut self, trainable: bool) {
        self.trainable = trainable;
    }

    pub fn numel(&self) -> usize {
        self.value.len()
    }

    /// Replaces the value, keeping shape and trainability.
    ///
    /// # Errors
    /// [`ModelError::ShapeMismatch`] if the new value has a different length.
    pub fn set_value(&mut self, value: Tensor1D<B>) -> Result<(), ModelError> {
        if value.len() != self.value.len() {
            return Err(ModelError::ShapeMismatch {
                name: "<param>".to_string(),
                expected: self.shape.clone(),
                got: vec![value.len()],
            });
        }
        self.value = value;
        Ok(())
    }
}

/// Ordered collection of named parameters.
///
/// The same type carries gradients: a gradient store uses the names of the
/// parameters it differentiates.
///
/// # Example
/// ```
/// use detector_models::backend::{CpuBackend, Tensor1D};
/// use detector_models::model::{Param, ParamStore};
///
/// let mut params = ParamStore::<CpuBackend>::new();
/// params.insert("weight", Param::new(Tensor1D::new(vec![1.0, 2.0, 3.0])));
/// params.insert("scale", Param::new(Tensor1D::new(vec![1.0])).frozen());
/// assert_eq!(params.trainable_numel(), 3);
/// ```
#[derive(Clone, Debug)]
pub struct ParamStore<B: Backend> {
    params: BTreeMap<String, Param<B>>,
}

impl<B: Backend> Default for ParamStore<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> ParamStore<B> {
    pub fn new() -> Self {
        Self {
            params: BTreeMap::new(),
        }
    }

    /// Inserts a parameter, returning the previous one under the same name.
    pub fn insert(&mut self, name: impl Into<String>, param: Param<B>) -> Option<Param<B>> {
        self.params.insert(name.into(), param)
    }

    /// Inserts a gradient (or any plain vector) as a trainable parameter.
    pub fn insert_tensor(&mut self, name: impl Into<String>, value: Tensor1D<B>) {
        self.params.insert(name.into(), Param::new(value));
    }

    pub fn get(&self, name: &str) -> Option<&Param<B>> {
        self.params.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Param<B>> {
        self.params.get_mut(name)
    }

    /// Value of the named parameter.
    ///
    /// # Errors
    /// [`ModelError::MissingParameter`] if no parameter has that name.
    pub fn tensor(&self, name: &str) -> Result<&Tensor1D<B>, ModelError> {
        self.params
            .get(name)
            .map(Param::value)
            .ok_or_else(|| ModelError::MissingParameter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Param<B>)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> btree_map::IterMut<'_, String, Param<B>> {
        self.params.iter_mut()
    }

    /// Number of scalar elements across trainable parameters.
    pub fn trainable_numel(&self) -> usize {
        self.params
            .values()
            .filter(|p| p.trainable)
            .map(Param::numel)
            .sum()
    }

    /// Places every parameter on `device`.
    pub fn to_device(&self, device: Device) -> Result<Self, ModelError> {
        let mut out = BTreeMap::new();
        for (name, p) in &self.params {
            out.insert(
                name.clone(),
                Param {
                    value: p.value.to_device(device)?,
                    shape: p.shape.clone(),
                    trainable: p.trainable,
                },
            );
        }
        Ok(Self { params: out })
    }

    /// Host copy of every parameter.
    pub fn state_dict(&self) -> StateDict {
        let tensors = self
            .params
            .iter()
            .map(|(name, p)| {
                let record = TensorRecord {
                    shape: p.shape.clone(),
                    data: p.value.to_vec(),
                    trainable: p.trainable,
                };
                (name.clone(), record)
            })
            .collect();
        StateDict { tensors }
    }

    /// Replaces every parameter value with the matching record in `dict`,
    /// placing the new values on `device`.
    ///
    /// Loading is strict and all-or-nothing: nothing is written unless every
    /// name matches and every shape agrees.
    ///
    /// # Errors
    /// - [`ModelError::MissingParameter`] for a parameter absent from `dict`
    /// - [`ModelError::UnexpectedParameter`] for a record with no parameter
    /// - [`ModelError::ShapeMismatch`] for disagreeing shapes or data lengths
    pub fn load_state_dict(&mut self, dict: &StateDict, device: Device) -> Result<(), ModelError> {
        if let Some(extra) = dict.names().find(|name| !self.params.contains_key(*name)) {
            return Err(ModelError::UnexpectedParameter(extra.to_string()));
        }

        let mut staged = Vec::with_capacity(self.params.len());
        for (name, p) in &self.params {
            let record = dict
                .get(name)
                .ok_or_else(|| ModelError::MissingParameter(name.clone()))?;
            if record.shape != p.shape {
                return Err(ModelError::ShapeMismatch {
                    name: name.clone(),
                    expected: p.shape.clone(),
                    got: record.shape.clone(),
                });
            }
            if record.data.len() != record.numel() {
                return Err(ModelError::ShapeMismatch {
                    name: name.clone(),
                    expected: record.shape.clone(),
                    got: vec![record.data.len()],
                });
            }
            let value = Tensor1D::from_f64(record.data.clone()).to_device(device)?;
            staged.push((name.clone(), value, record.trainable));
        }

        for (name, value, trainable) in staged {
            if let Some(p) = self.params.get_mut(&name) {
                p.value = value;
                p.trainable = trainable;
            }
        }
        Ok(())
    }
}

/// Host-side copy of one parameter, at the backend's full precision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
    pub trainable: bool,
}

impl TensorRecord {
    /// Element count implied by `shape`.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// Serializable mapping from parameter name to its host copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    tensors: BTreeMap<String, TensorRecord>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, record: TensorRecord) -> Option<TensorRecord> {
        self.tensors.insert(name.into(), record)
    }

    pub fn get(&self, name: &str) -> Option<&TensorRecord> {
        self.tensors.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<TensorRecord> {
        self.tensors.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TensorRecord)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CpuBackend;

    type Store = ParamStore<CpuBackend>;

    fn store() -> Store {
        let mut s = Store::new();
        s.insert(
            "weight",
            Param::with_shape(Tensor1D::new(vec![1.0, 2.0, 3.0, 4.0]), vec![2, 2]).unwrap(),
        );
        s.insert("bias", Param::new(Tensor1D::new(vec![0.5])).frozen());
        s
    }

    #[test]
    fn test_with_shape_rejects_wrong_numel() {
        let err = Param::<CpuBackend>::with_shape(Tensor1D::zeros(3), vec![2, 2]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_trainable_numel_skips_frozen() {
        let s = store();
        assert_eq!(s.len(), 2);
        assert_eq!(s.trainable_numel(), 4);
    }

    #[test]
    fn test_tensor_lookup() {
        let s = store();
        assert_eq!(s.tensor("bias").unwrap().to_vec(), vec![0.5]);
        assert!(matches!(
            s.tensor("nope"),
            Err(ModelError::MissingParameter(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_names_are_sorted() {
        let s = store();
        assert_eq!(s.names().collect::<Vec<_>>(), vec!["bias", "weight"]);
    }

    #[test]
    fn test_set_value_checks_length() {
        let mut p = Param::<CpuBackend>::new(Tensor1D::zeros(2));
        assert!(p.set_value(Tensor1D::zeros(3)).is_err());
        p.set_value(Tensor1D::new(vec![1.0, 1.0])).unwrap();
        assert_eq!(p.value().to_vec(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_state_dict_roundtrip() {
        let s = store();
        let dict = s.state_dict();
        assert_eq!(dict.get("weight").unwrap().shape, vec![2, 2]);
        assert!(!dict.get("bias").unwrap().trainable);

        let mut fresh = Store::new();
        fresh.insert(
            "weight",
            Param::with_shape(Tensor1D::zeros(4), vec![2, 2]).unwrap(),
        );
        fresh.insert("bias", Param::new(Tensor1D::zeros(1)));
        fresh.load_state_dict(&dict, Device::Cpu).unwrap();

        assert_eq!(fresh.tensor("weight").unwrap().to_vec(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(!fresh.get("bias").unwrap().is_trainable());
    }

    #[test]
    fn test_state_dict_is_lossless() {
        let third = 1.0 / 3.0;
        let mut s = Store::new();
        s.insert("w", Param::new(Tensor1D::from_f64(vec![third, 0.2])));
        let dict = s.state_dict();
        assert_eq!(dict.get("w").unwrap().data, vec![third, 0.2]);

        let mut fresh = Store::new();
        fresh.insert("w", Param::new(Tensor1D::zeros(2)));
        fresh.load_state_dict(&dict, Device::Cpu).unwrap();
        assert_eq!(fresh.tensor("w").unwrap().to_vec(), vec![third, 0.2]);
    }

    #[test]
    fn test_load_rejects_missing() {
        let mut dict = store().state_dict();
        dict.remove("bias");
        let mut s = store();
        assert!(matches!(
            s.load_state_dict(&dict, Device::Cpu),
            Err(ModelError::MissingParameter(name)) if name == "bias"
        ));
    }

    #[test]
    fn test_load_rejects_unexpected() {
        let mut dict = store().state_dict();
        dict.insert(
            "extra",
            TensorRecord {
                shape: vec![1],
                data: vec![0.0],
                trainable: true,
            },
        );
        let mut s = store();
        assert!(matches!(
            s.load_state_dict(&dict, Device::Cpu),
            Err(ModelError::UnexpectedParameter(name)) if name == "extra"
        ));
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let mut dict = store().state_dict();
        dict.insert(
            "weight",
            TensorRecord {
                shape: vec![4],
                data: vec![9.0; 4],
                trainable: true,
            },
        );
        dict.insert(
            "bias",
            TensorRecord {
                shape: vec![1],
                data: vec![7.0],
                trainable: true,
            },
        );
        let mut s = store();
        assert!(matches!(
            s.load_state_dict(&dict, Device::Cpu),
            Err(ModelError::ShapeMismatch { .. })
        ));
        assert_eq!(s.tensor("bias").unwrap().to_vec(), vec![0.5]);
    }

    #[test]
    fn test_load_rejects_truncated_data() {
        let mut dict = store().state_dict();
        dict.insert(
            "bias",
            TensorRecord {
                shape: vec![1],
                data: vec![],
                trainable: false,
            },
        );
        let mut s = store();
        assert!(s.load_state_dict(&dict, Device::Cpu).is_err());
    }

    #[test]
    fn test_to_device_unavailable() {
        assert!(matches!(
            store().to_device(Device::Cuda(0)),
            Err(ModelError::DeviceUnavailable { .. })
        ));
    }
}
