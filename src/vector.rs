//! The vector capability consumed by the index.

use std::rc::Rc;
use std::sync::Arc;

use ndarray::{Array1, ArrayView1};

/// A dense `f32` vector the index can project and score.
///
/// Only [`view`](DenseVector::view) is required; dimension and dot product
/// are derived from it.
pub trait DenseVector {
    /// Borrow the components as a one-dimensional array view.
    fn view(&self) -> ArrayView1<'_, f32>;

    /// Number of components.
    fn dim(&self) -> usize {
        self.view().len()
    }

    /// Dot product with another vector of equal dimension.
    fn dot(&self, other: &ArrayView1<'_, f32>) -> f32 {
        self.view().dot(other)
    }
}

impl DenseVector for [f32] {
    fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(self)
    }
}

impl DenseVector for Vec<f32> {
    fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(self.as_slice())
    }
}

impl<const N: usize> DenseVector for [f32; N] {
    fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::from(&self[..])
    }
}

impl DenseVector for Array1<f32> {
    fn view(&self) -> ArrayView1<'_, f32> {
        Array1::view(self)
    }
}

impl DenseVector for ArrayView1<'_, f32> {
    fn view(&self) -> ArrayView1<'_, f32> {
        ArrayView1::view(self)
    }
}

impl<T: DenseVector + ?Sized> DenseVector for &T {
    fn view(&self) -> ArrayView1<'_, f32> {
        (**self).view()
    }
}

impl<T: DenseVector + ?Sized> DenseVector for Box<T> {
    fn view(&self) -> ArrayView1<'_, f32> {
        (**self).view()
    }
}

impl<T: DenseVector + ?Sized> DenseVector for Rc<T> {
    fn view(&self) -> ArrayView1<'_, f32> {
        (**self).view()
    }
}

impl<T: DenseVector + ?Sized> DenseVector for Arc<T> {
    fn view(&self) -> ArrayView1<'_, f32> {
        (**self).view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_dim_and_dot_across_impls() {
        let axis = array![1.0_f32, 0.0, 2.0];
        let v = vec![3.0_f32, 5.0, 1.0];
        let a = array![3.0_f32, 5.0, 1.0];
        let shared = Arc::new(v.clone());

        assert_eq!(v.dim(), 3);
        assert_eq!(v.dot(&axis.view()), 5.0);
        assert_eq!(a.dot(&axis.view()), 5.0);
        assert_eq!(shared.dot(&axis.view()), 5.0);
        assert_eq!(v.as_slice().dim(), 3);
        assert_eq!([3.0_f32, 5.0, 1.0].dot(&axis.view()), 5.0);
    }
}
