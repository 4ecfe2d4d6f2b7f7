//! Named n-dimensional variables grouped into a dataset.
//!
//! A [`Dataset`] is the in-memory form of a NetCDF file or Zarr group: a set
//! of [`Variable`]s whose named dimensions must agree on their sizes. Index
//! coordinates are ordinary 1-D variables named after their own dimension
//! (e.g. `lon_t` over `lon_t`).

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;

use ndarray::{concatenate, Array1, ArrayD, Axis, IxDyn};

use crate::error::{DatasetError, DatasetResult};
use crate::reduce::nanmean_axis;

/// An n-dimensional `f64` array with named dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Dimension names, one per array axis
    pub dims: Vec<String>,
    /// Values, NaN marks missing data
    pub data: ArrayD<f64>,
    /// String attributes carried over from the source file
    pub attrs: BTreeMap<String, String>,
}

impl Variable {
    /// Create a variable, checking that every axis has exactly one distinct name.
    pub fn new<S: Into<String>>(dims: Vec<S>, data: ArrayD<f64>) -> DatasetResult<Self> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();
        if dims.len() != data.ndim() {
            return Err(DatasetError::Shape(format!(
                "{} dimension names for a {}-d array",
                dims.len(),
                data.ndim()
            )));
        }
        let unique: BTreeSet<&String> = dims.iter().collect();
        if unique.len() != dims.len() {
            return Err(DatasetError::Shape(format!(
                "repeated dimension name in {:?}",
                dims
            )));
        }
        Ok(Self {
            dims,
            data,
            attrs: BTreeMap::new(),
        })
    }

    /// Create a variable from row-major values.
    pub fn from_shape_vec(dims: &[&str], shape: &[usize], values: Vec<f64>) -> DatasetResult<Self> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Self::new(dims.to_vec(), data)
    }

    /// Create a 1-D index coordinate living on the dimension of the same name.
    pub fn coordinate(name: &str, values: Array1<f64>) -> Self {
        Self {
            dims: vec![name.to_string()],
            data: values.into_dyn(),
            attrs: BTreeMap::new(),
        }
    }

    /// Create a 0-d variable.
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: Vec::new(),
            data: ArrayD::from_elem(IxDyn(&[]), value),
            attrs: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Axis index of a named dimension.
    pub fn axis_of(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Length of a named dimension.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis_of(dim).map(|axis| self.data.shape()[axis])
    }

    /// Whether this variable is the index coordinate of `name`.
    pub fn is_index_of(&self, name: &str) -> bool {
        self.dims.len() == 1 && self.dims[0] == name
    }

    /// Values in row-major order.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    /// Mean along `dim`, skipping NaN. The dimension is removed from the result.
    pub fn nanmean_over(&self, dim: &str) -> DatasetResult<Variable> {
        let axis = self
            .axis_of(dim)
            .ok_or_else(|| DatasetError::MissingName(dim.to_string()))?;
        let mut dims = self.dims.clone();
        dims.remove(axis);
        Ok(Variable {
            dims,
            data: nanmean_axis(&self.data, Axis(axis)),
            attrs: self.attrs.clone(),
        })
    }

    /// Apply `f` element-wise.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Variable {
        Variable {
            dims: self.dims.clone(),
            data: self.data.mapv(f),
            attrs: self.attrs.clone(),
        }
    }

    fn squeezed(&self) -> Variable {
        let mut data = self.data.clone();
        let mut dims = Vec::with_capacity(self.dims.len());
        // Last axis first so remaining indices stay valid
        for axis in (0..self.ndim()).rev() {
            if self.data.shape()[axis] == 1 {
                data = data.index_axis_move(Axis(axis), 0);
            } else {
                dims.push(self.dims[axis].clone());
            }
        }
        dims.reverse();
        Variable {
            dims,
            data,
            attrs: self.attrs.clone(),
        }
    }

    fn rename_dim(&mut self, from: &str, to: &str) {
        for dim in self.dims.iter_mut().filter(|d| d.as_str() == from) {
            *dim = to.to_string();
        }
    }
}

/// A set of variables sharing named dimensions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    variables: BTreeMap<String, Variable>,
    attrs: BTreeMap<String, String>,
    chunks: BTreeMap<String, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Dataset::insert`].
    pub fn with_variable(mut self, name: &str, var: Variable) -> DatasetResult<Self> {
        self.insert(name, var)?;
        Ok(self)
    }

    /// Insert or replace a variable.
    ///
    /// Fails if one of its dimensions already exists with another size.
    pub fn insert(&mut self, name: impl Into<String>, var: Variable) -> DatasetResult<()> {
        let name = name.into();
        let sizes = dim_sizes(
            self.variables
                .iter()
                .filter(|(other, _)| **other != name)
                .map(|(_, v)| v),
        );
        for (dim, &found) in var.dims.iter().zip(var.shape()) {
            if let Some(&existing) = sizes.get(dim) {
                if existing != found {
                    return Err(DatasetError::DimensionConflict {
                        dim: dim.clone(),
                        existing,
                        found,
                    });
                }
            }
        }
        self.variables.insert(name, var);
        Ok(())
    }

    /// Assign explicit values to a dimension, creating its index coordinate.
    pub fn assign_coord(&mut self, name: &str, values: Array1<f64>) -> DatasetResult<()> {
        self.insert(name, Variable::coordinate(name, values))
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Like [`Dataset::get`] but with a descriptive error.
    pub fn variable(&self, name: &str) -> DatasetResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Variable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Sizes of every dimension used by at least one variable.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        dim_sizes(self.variables.values())
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.variables.values().any(|v| v.axis_of(dim).is_some())
    }

    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    /// Rename a variable and/or a dimension.
    ///
    /// Fails if `from` names neither, or if `to` is already taken.
    pub fn rename(&mut self, from: &str, to: &str) -> DatasetResult<()> {
        let is_var = self.contains(from);
        let is_dim = self.has_dim(from);
        if !is_var && !is_dim {
            return Err(DatasetError::MissingName(from.to_string()));
        }
        if from == to {
            return Ok(());
        }
        if (is_var && self.contains(to)) || (is_dim && self.has_dim(to)) {
            return Err(DatasetError::NameConflict(to.to_string()));
        }

        if let Some(var) = self.variables.remove(from) {
            self.variables.insert(to.to_string(), var);
        }
        if is_dim {
            for var in self.variables.values_mut() {
                var.rename_dim(from, to);
            }
            if let Some(size) = self.chunks.remove(from) {
                self.chunks.insert(to.to_string(), size);
            }
        }
        Ok(())
    }

    /// Apply several renames atomically: on error the dataset is left untouched.
    pub fn rename_all<A: AsRef<str>, B: AsRef<str>>(&mut self, pairs: &[(A, B)]) -> DatasetResult<()> {
        let mut renamed = self.clone();
        for (from, to) in pairs {
            renamed.rename(from.as_ref(), to.as_ref())?;
        }
        *self = renamed;
        Ok(())
    }

    /// Drop the named variables, ignoring names that are absent.
    ///
    /// Returns the names actually dropped.
    pub fn drop_vars<S: AsRef<str>>(&mut self, names: &[S]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| {
                self.variables
                    .remove(name.as_ref())
                    .map(|_| name.as_ref().to_string())
            })
            .collect()
    }

    /// Remove every dimension of length one.
    pub fn squeeze(&mut self) {
        let singleton: Vec<String> = self
            .dims()
            .into_iter()
            .filter(|(_, len)| *len == 1)
            .map(|(dim, _)| dim)
            .collect();
        if singleton.is_empty() {
            return;
        }
        for var in self.variables.values_mut() {
            if var.dims.iter().any(|d| singleton.contains(d)) {
                *var = var.squeezed();
            }
        }
        self.chunks.retain(|dim, _| !singleton.contains(dim));
    }

    /// Keep only the named variables plus the index coordinates they use.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> DatasetResult<Dataset> {
        let mut out = Dataset {
            attrs: self.attrs.clone(),
            ..Dataset::default()
        };
        for name in names {
            let var = self.variable(name.as_ref())?;
            out.variables.insert(name.as_ref().to_string(), var.clone());
        }

        let used: BTreeSet<String> = out
            .variables
            .values()
            .flat_map(|v| v.dims.iter().cloned())
            .collect();
        for dim in &used {
            if let Some(coord) = self.variables.get(dim) {
                if coord.is_index_of(dim) {
                    out.variables
                        .entry(dim.clone())
                        .or_insert_with(|| coord.clone());
                }
            }
        }
        out.chunks = self
            .chunks
            .iter()
            .filter(|(dim, _)| used.contains(*dim))
            .map(|(dim, size)| (dim.clone(), *size))
            .collect();
        Ok(out)
    }

    /// Concatenate datasets along `dim`.
    ///
    /// Variables spanning `dim` are joined in order; the others are taken
    /// from the first dataset. Every part must hold the same variables.
    pub fn concat(parts: Vec<Dataset>, dim: &str) -> DatasetResult<Dataset> {
        let mut parts = parts.into_iter();
        let first = parts
            .next()
            .ok_or_else(|| DatasetError::Shape("cannot concatenate zero datasets".to_string()))?;
        let rest: Vec<Dataset> = parts.collect();
        if rest.is_empty() {
            return Ok(first);
        }
        if !first.has_dim(dim) {
            return Err(DatasetError::MissingName(dim.to_string()));
        }
        for (i, part) in rest.iter().enumerate() {
            if let Some(extra) = part.variables.keys().find(|n| !first.variables.contains_key(*n)) {
                return Err(DatasetError::Shape(format!(
                    "variable '{}' of part {} is missing from the first part",
                    extra,
                    i + 1
                )));
            }
        }

        let mut out = Dataset {
            attrs: first.attrs.clone(),
            chunks: first.chunks.clone(),
            variables: BTreeMap::new(),
        };
        for (name, var) in &first.variables {
            let Some(axis) = var.axis_of(dim) else {
                out.variables.insert(name.clone(), var.clone());
                continue;
            };

            let mut views = vec![var.data.view()];
            for part in &rest {
                let other = part.variable(name)?;
                if other.dims != var.dims {
                    return Err(DatasetError::Shape(format!(
                        "variable '{}' has dimensions {:?} and {:?} in different parts",
                        name, var.dims, other.dims
                    )));
                }
                views.push(other.data.view());
            }
            let data = concatenate(Axis(axis), &views)?;
            out.variables.insert(
                name.clone(),
                Variable {
                    dims: var.dims.clone(),
                    data,
                    attrs: var.attrs.clone(),
                },
            );
        }
        Ok(out)
    }

    /// Record a chunk layout, merged into the existing one.
    pub fn set_chunks(&mut self, chunks: &BTreeMap<String, usize>) -> DatasetResult<()> {
        let dims = self.dims();
        for (dim, &size) in chunks {
            if !dims.contains_key(dim) {
                return Err(DatasetError::MissingName(dim.clone()));
            }
            if size == 0 {
                return Err(DatasetError::InvalidChunk(dim.clone()));
            }
        }
        self.chunks
            .extend(chunks.iter().map(|(dim, size)| (dim.clone(), *size)));
        Ok(())
    }

    pub fn chunks(&self) -> &BTreeMap<String, usize> {
        &self.chunks
    }

    /// Index ranges of the chunks along `dim`; a single range when unchunked.
    pub fn chunk_ranges(&self, dim: &str) -> DatasetResult<Vec<Range<usize>>> {
        let len = *self
            .dims()
            .get(dim)
            .ok_or_else(|| DatasetError::MissingName(dim.to_string()))?;
        let step = self.chunks.get(dim).copied().unwrap_or(len).max(1);
        Ok((0..len)
            .step_by(step)
            .map(|start| start..(start + step).min(len))
            .collect())
    }

    /// Apply `f` element-wise to one variable in place.
    pub fn map_variable(&mut self, name: &str, f: impl Fn(f64) -> f64) -> DatasetResult<()> {
        let var = self
            .variables
            .get_mut(name)
            .ok_or_else(|| DatasetError::MissingVariable(name.to_string()))?;
        var.data.mapv_inplace(f);
        Ok(())
    }

    /// Combine the variables present in both datasets element-wise.
    ///
    /// Index coordinates are kept from `self`; variables missing from
    /// `other` are dropped.
    pub fn zip_with(&self, other: &Dataset, f: impl Fn(f64, f64) -> f64) -> DatasetResult<Dataset> {
        let mut out = Dataset {
            attrs: self.attrs.clone(),
            chunks: self.chunks.clone(),
            variables: BTreeMap::new(),
        };
        for (name, var) in &self.variables {
            if var.is_index_of(name) {
                out.variables.insert(name.clone(), var.clone());
                continue;
            }
            let Some(rhs) = other.variables.get(name) else {
                continue;
            };
            if var.shape() != rhs.shape() {
                return Err(DatasetError::Shape(format!(
                    "variable '{}' has shape {:?} and {:?}",
                    name,
                    var.shape(),
                    rhs.shape()
                )));
            }
            let mut data = var.data.clone();
            data.zip_mut_with(&rhs.data, |a, &b| *a = f(*a, b));
            out.variables.insert(
                name.clone(),
                Variable {
                    dims: var.dims.clone(),
                    data,
                    attrs: var.attrs.clone(),
                },
            );
        }
        Ok(out)
    }
}

fn dim_sizes<'a>(vars: impl Iterator<Item = &'a Variable>) -> BTreeMap<String, usize> {
    let mut sizes = BTreeMap::new();
    for var in vars {
        for (dim, &len) in var.dims.iter().zip(var.shape()) {
            sizes.entry(dim.clone()).or_insert(len);
        }
    }
    sizes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> Dataset {
        Dataset::new()
            .with_variable(
                "tem",
                Variable::from_shape_vec(&["time", "ni_t"], &[2, 3], vec![1., 2., 3., 4., 5., 6.])
                    .unwrap(),
            )
            .unwrap()
            .with_variable("ni_t", Variable::coordinate("ni_t", array![0., 1., 2.]))
            .unwrap()
    }

    #[test]
    fn test_insert_rejects_size_conflict() {
        let mut ds = sample();
        let err = ds
            .insert("bad", Variable::coordinate("ni_t", array![0., 1.]))
            .unwrap_err();
        assert!(matches!(err, DatasetError::DimensionConflict { existing: 3, found: 2, .. }));
    }

    #[test]
    fn test_replace_index_coordinate_with_same_length() {
        let mut ds = sample();
        ds.assign_coord("ni_t", array![100., 101., 102.]).unwrap();
        assert_eq!(ds.get("ni_t").unwrap().values(), vec![100., 101., 102.]);
    }

    #[test]
    fn test_rename_moves_variable_and_dimension() {
        let mut ds = sample();
        ds.rename("ni_t", "lon_t").unwrap();
        assert!(ds.contains("lon_t"));
        assert!(!ds.contains("ni_t"));
        assert_eq!(ds.get("tem").unwrap().dims, vec!["time", "lon_t"]);
    }

    #[test]
    fn test_rename_dimension_without_variable() {
        let mut ds = sample();
        ds.rename("time", "t").unwrap();
        assert_eq!(ds.get("tem").unwrap().dims, vec!["t", "ni_t"]);
    }

    #[test]
    fn test_rename_missing_name_fails() {
        let mut ds = sample();
        assert!(matches!(
            ds.rename("nope", "x"),
            Err(DatasetError::MissingName(_))
        ));
    }

    #[test]
    fn test_rename_all_is_atomic() {
        let mut ds = sample();
        let before = ds.clone();
        assert!(ds.rename_all(&[("ni_t", "lon_t"), ("missing", "x")]).is_err());
        assert_eq!(ds, before);
    }

    #[test]
    fn test_drop_vars_ignores_absent() {
        let mut ds = sample();
        let dropped = ds.drop_vars(&["ni_t", "cumulativetime"]);
        assert_eq!(dropped, vec!["ni_t".to_string()]);
        assert!(!ds.contains("ni_t"));
    }

    #[test]
    fn test_squeeze_removes_singleton_dims() {
        let mut ds = Dataset::new()
            .with_variable(
                "ssh",
                Variable::from_shape_vec(&["time", "depth", "x"], &[1, 1, 2], vec![1., 2.]).unwrap(),
            )
            .unwrap();
        ds.squeeze();
        let var = ds.get("ssh").unwrap();
        assert_eq!(var.dims, vec!["x"]);
        assert_eq!(var.values(), vec![1., 2.]);
    }

    #[test]
    fn test_concat_along_time() {
        let a = sample();
        let b = sample();
        let ds = Dataset::concat(vec![a, b], "time").unwrap();
        assert_eq!(ds.get("tem").unwrap().shape(), &[4, 3]);
        assert_eq!(ds.get("ni_t").unwrap().shape(), &[3]);
    }

    #[test]
    fn test_concat_rejects_variables_of_later_parts() {
        let a = sample();
        let mut b = sample();
        let extra = b.get("tem").unwrap().clone();
        b.insert("sal", extra).unwrap();
        assert!(matches!(
            Dataset::concat(vec![a, b], "time"),
            Err(DatasetError::Shape(_))
        ));
    }

    #[test]
    fn test_chunk_ranges() {
        let mut ds = sample();
        let mut chunks = BTreeMap::new();
        chunks.insert("ni_t".to_string(), 2);
        ds.set_chunks(&chunks).unwrap();
        assert_eq!(ds.chunk_ranges("ni_t").unwrap(), vec![0..2, 2..3]);
        assert_eq!(ds.chunk_ranges("time").unwrap(), vec![0..2]);
    }

    #[test]
    fn test_set_chunks_unknown_dim_fails() {
        let mut ds = sample();
        let mut chunks = BTreeMap::new();
        chunks.insert("depth".to_string(), 2);
        assert!(ds.set_chunks(&chunks).is_err());
    }

    #[test]
    fn test_zip_with_keeps_coordinates() {
        let a = sample();
        let b = sample();
        let diff = a.zip_with(&b, |x, y| x - y).unwrap();
        assert!(diff.get("tem").unwrap().values().iter().all(|v| *v == 0.0));
        assert_eq!(diff.get("ni_t").unwrap().values(), vec![0., 1., 2.]);
    }

    #[test]
    fn test_nanmean_over_skips_nan() {
        let var = Variable::from_shape_vec(&["y", "x"], &[2, 2], vec![1., f64::NAN, 3., 4.]).unwrap();
        let mean = var.nanmean_over("y").unwrap();
        assert_eq!(mean.dims, vec!["x"]);
        assert_eq!(mean.values(), vec![2., 4.]);
    }
}
