use ndarray::Array2;

/// Per-pixel arithmetic mean of equally shaped layers.
///
/// Callers guarantee at least one layer and matching shapes.
pub fn mean_combine(layers: &[&Array2<f32>]) -> Array2<f32> {
    let Some(first) = layers.first() else {
        return Array2::zeros((0, 0));
    };
    if layers.len() == 1 {
        return (*first).clone();
    }

    let mut sum = Array2::<f64>::zeros(first.dim());
    for layer in layers {
        sum.zip_mut_with(*layer, |acc, &v| *acc += v as f64);
    }

    let n = layers.len() as f64;
    sum.mapv(|v| (v / n) as f32)
}
