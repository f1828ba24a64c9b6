/// L2-normalized copy of `v`; the zero vector stays zero.
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 { return v.to_vec(); }
    v.iter().map(|x| x / norm).collect()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_dot_ignores_magnitude() {
        let a = normalize(&[1.0, 2.0, 3.0]);
        let b = normalize(&[2.0, 4.0, 6.0]);
        assert!((dot(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_and_zero_vectors_score_zero() {
        assert_eq!(dot(&normalize(&[1.0, 0.0]), &normalize(&[0.0, 1.0])), 0.0);
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }
}
