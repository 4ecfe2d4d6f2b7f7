use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricError {
    #[error("arrays have different shapes: {left:?} vs {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("axis {axis} out of range for a {ndim}-d array")]
    AxisOutOfRange { axis: usize, ndim: usize },

    #[error("weights of shape {weights:?} cannot be broadcast to {data:?}")]
    WeightsNotBroadcastable { weights: Vec<usize>, data: Vec<usize> },

    #[error("unknown metric '{tag}', expected one of: {valid}")]
    UnknownMetric { tag: String, valid: String },

    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type MetricResult<T> = Result<T, MetricError>;
