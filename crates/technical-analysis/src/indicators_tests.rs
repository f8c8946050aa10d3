#[cfg(test)]
mod tests {
    use super::super::indicators::*;

    // Helper function to create sample price data
    fn sample_prices() -> Vec<f64> {
        vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ]
    }

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 0.001); // (1+2+3)/3 = 2
        assert!((result[1] - 3.0).abs() < 0.001); // (2+3+4)/3 = 3
        assert!((result[2] - 4.0).abs() < 0.001); // (3+4+5)/3 = 4
    }

    #[test]
    fn test_sma_insufficient_data() {
        let data = vec![1.0, 2.0];
        let result = sma(&data, 5);

        assert_eq!(result.len(), 0);
    }

    #[test]
    fn test_trailing_mean() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert!((trailing_mean(&data, 2).unwrap() - 4.5).abs() < 1e-9);
        assert_eq!(trailing_mean(&data, 6), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let data = vec![4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(quantile(&data, 0.0), Some(1.0));
        assert_eq!(quantile(&data, 1.0), Some(5.0));
        assert!((quantile(&data, 0.5).unwrap() - 3.0).abs() < 1e-9);
        assert!((quantile(&data, 0.1).unwrap() - 1.4).abs() < 1e-9);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_winsorize_clips_outliers() {
        let mut data: Vec<f64> = (1..=1000).map(|v| v as f64).collect();
        data[500] = 100_000.0;
        let clipped = winsorize(&data, 0.01, 0.99);

        let max = clipped.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!(max <= 1000.0);
        assert_eq!(clipped.len(), data.len());
    }

    #[test]
    fn test_winsorize_degenerate_band_is_noop() {
        let flat = vec![5.0; 10];
        assert_eq!(winsorize(&flat, 0.01, 0.99), flat);

        let with_zero = vec![0.0, 0.0, 0.0, 1.0];
        assert_eq!(winsorize(&with_zero, 0.01, 0.99), with_zero);
    }

    #[test]
    fn test_pct_returns() {
        let returns = pct_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - 0.10).abs() < 1e-9);
        assert!((returns[1] + 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_population_std_dev() {
        // Population variance of [2,4,4,4,5,5,7,9] is 4
        let data = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((population_std_dev(&data).unwrap() - 2.0).abs() < 1e-9);
        assert_eq!(population_std_dev(&[]), None);
        assert_eq!(population_std_dev(&[3.0]), Some(0.0));
    }

    #[test]
    fn test_rsi_range() {
        let prices = sample_prices();
        let rsi = rolling_rsi(&prices, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }

    #[test]
    fn test_rsi_needs_period_plus_one() {
        let prices: Vec<f64> = (0..14).map(|v| 10.0 + v as f64).collect();
        assert_eq!(rolling_rsi(&prices, 14), None);
    }

    #[test]
    fn test_rsi_extremes() {
        let rising: Vec<f64> = (0..15).map(|v| 10.0 + v as f64).collect();
        assert_eq!(rolling_rsi(&rising, 14), Some(100.0));

        let falling: Vec<f64> = (0..15).map(|v| 30.0 - v as f64).collect();
        assert_eq!(rolling_rsi(&falling, 14), Some(0.0));

        let flat = vec![10.0; 15];
        assert_eq!(rolling_rsi(&flat, 14), None);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // Equal gains and losses -> RSI 50
        let mut prices = vec![100.0];
        for i in 0..14 {
            let last = *prices.last().unwrap();
            prices.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        assert!((rolling_rsi(&prices, 14).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_extrema() {
        assert_eq!(extrema(&[3.0, 9.0, 1.0]), Some((9.0, 1.0)));
        assert_eq!(extrema(&[]), None);
    }

    #[test]
    fn test_volume_profile() {
        let volumes: Vec<Option<f64>> = (1..=25).map(|v| Some(v as f64)).collect();
        let (avg, cur) = volume_profile(&volumes, 20).unwrap();
        assert!((avg - 15.5).abs() < 1e-9); // mean of 6..=25
        assert_eq!(cur, Some(25.0));
        assert_eq!(volume_profile(&volumes[..19], 20), None);
    }

    #[test]
    fn test_volume_profile_latest_session_missing() {
        let mut volumes: Vec<Option<f64>> = (1..=25).map(|v| Some(v as f64)).collect();
        volumes.push(None);
        let (avg, cur) = volume_profile(&volumes, 20).unwrap();
        assert!((avg - 15.5).abs() < 1e-9);
        assert_eq!(cur, None);
    }
}
