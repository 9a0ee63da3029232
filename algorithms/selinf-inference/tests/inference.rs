use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use selinf::{traits::Fit, Dataset};
use selinf_datasets::generate::{gaussian_design, null_response, sparse_regression, standardize_columns};
use selinf_inference::{estimate_sigma, infer, InferenceError, InferenceMode, InferenceParams};
use selinf_lar::{LarParams, LarPath};

fn two_signal_path(seed: u64) -> LarPath<f64> {
    let mut rng = Xoshiro256Plus::seed_from_u64(seed);
    let mut beta = Array1::<f64>::zeros(10);
    beta[2] = 4.0;
    beta[7] = -3.0;
    let ds = sparse_regression(50, &beta, 1.0, &mut rng);
    LarParams::new().fit(&ds).unwrap()
}

#[test]
fn two_signals_among_ten_variables() {
    let path = two_signal_path(42);

    assert!(path.completepath());
    assert_eq!(path.nsteps(), 10);
    let corr = path.x().t().dot(path.y()).mapv(f64::abs);
    let best = corr
        .iter()
        .enumerate()
        .fold(0, |best, (i, &c)| if c > corr[best] { i } else { best });
    assert_eq!(path.actions()[0], best);

    let inference = InferenceParams::new()
        .sigma(Some(1.0))
        .mode(InferenceMode::Active)
        .infer(&path)
        .unwrap();

    assert_eq!(inference.k(), 10);
    assert_eq!(inference.vars(), path.actions());
    assert_eq!(inference.pv().len(), 10);
    assert!(inference.pv().iter().all(|pv| (0.0..=1.0).contains(pv)));
    assert_eq!(inference.ci().dim(), (10, 2));
    for row in inference.ci().rows() {
        assert!(row[0] <= row[1]);
    }
    assert_eq!(inference.tailarea().dim(), (10, 2));
    assert_eq!(inference.vmat().dim(), (10, 50));

    // the signals enter first and are clearly significant
    let mut first_two = path.actions()[..2].to_vec();
    first_two.sort_unstable();
    assert_eq!(first_two, vec![2, 7]);
    assert!(inference.pv()[0] < 0.01);
    assert!(inference.pv()[1] < 0.01);
    assert!(inference.khat().unwrap() >= 2);

    // approximate tests are available for every step of a complete path
    assert_eq!(inference.pv_spacing().len(), 10);
    assert!(inference.pv_asymptotic().iter().all(Option::is_some));
    assert!(inference.pv_covtest().iter().all(Option::is_some));
}

#[test]
fn intervals_are_on_the_coefficient_scale() {
    let path = two_signal_path(7);
    let inference = infer(&path, &InferenceParams::new().sigma(Some(1.0)).k(Some(2))).unwrap();

    for (i, &var) in inference.vars().iter().enumerate() {
        // least squares coefficient of the entering variable, original scale
        let coef = path.contrasts().row(i).dot(path.y()) * path.signs()[i] / path.sx()[var];
        assert_abs_diff_eq!(
            inference.vmat().row(i).dot(path.y()) * inference.sign()[i],
            coef,
            epsilon = 1e-10
        );
        assert_eq!(inference.sign()[i], coef.signum());
        assert!(inference.ci()[[i, 0]] <= coef && coef <= inference.ci()[[i, 1]]);
    }
    // the negative signal has a negative interval
    let neg = inference.vars().iter().position(|&v| v == 7).unwrap();
    assert_eq!(inference.sign()[neg], -1.0);
    assert!(inference.ci()[[neg, 1]] < 0.0);
    // truncation limits bound the signed coefficient
    for i in 0..2 {
        let signed = inference.vmat().row(i).dot(path.y());
        assert!(inference.vlo()[i] <= signed + 1e-10 && signed <= inference.vup()[i] + 1e-10);
    }
}

#[test]
fn all_mode_tests_the_selected_model() {
    let path = two_signal_path(3);
    let inference = InferenceParams::new()
        .sigma(Some(1.0))
        .mode(InferenceMode::All)
        .k(Some(3))
        .infer(&path)
        .unwrap();

    assert_eq!(inference.vars(), &path.actions()[..3]);
    assert_eq!(inference.pv().len(), 3);
    assert_eq!(inference.khat(), None);
    assert!(inference.pv_spacing().is_empty());

    // directions are the rows of the pseudo inverse, scaled back to the records
    let active = &path.actions()[..3];
    let xa = path.x().select(Axis(1), active);
    let ls = selinf_lar::QrFactor::thin_from_columns(&xa)
        .unwrap()
        .least_squares(path.y())
        .unwrap();
    for (i, &var) in active.iter().enumerate() {
        assert_abs_diff_eq!(
            inference.vmat().row(i).dot(path.y()) * inference.sign()[i],
            ls[i] / path.sx()[var],
            epsilon = 1e-10
        );
    }

    let too_far = InferenceParams::new()
        .sigma(Some(1.0))
        .mode(InferenceMode::All)
        .k(Some(11))
        .infer(&path);
    assert!(matches!(
        too_far,
        Err(InferenceError::InsufficientPath {
            requested: 11,
            available: 10
        })
    ));
}

#[test]
fn aic_mode_conditions_on_the_stopping_event() {
    let path = two_signal_path(11);
    let inference = InferenceParams::new()
        .sigma(Some(1.0))
        .mode(InferenceMode::Aic)
        .infer(&path)
        .unwrap();

    let khat = inference.khat().unwrap();
    assert!(khat >= 2);
    assert_eq!(inference.pv().len(), khat);
    assert_eq!(inference.vars(), &path.actions()[..khat]);
    assert_eq!(inference.k(), 10);
    let aic = inference.aic().unwrap();
    assert!(aic.len() > khat);
    // both signals improve on the empty model
    assert!(aic[2] < aic[1] && aic[1] < aic[0]);
    assert!(inference.pv()[0] < 0.01);
}

#[test]
fn active_mode_clamps_the_number_of_steps() {
    let path = two_signal_path(5);
    let inference = InferenceParams::new()
        .sigma(Some(1.0))
        .k(Some(25))
        .infer(&path)
        .unwrap();
    assert_eq!(inference.k(), 10);
    assert_eq!(inference.pv().len(), 10);
}

#[test]
fn incomplete_path_has_no_tail_tests_at_its_end() {
    let mut rng = Xoshiro256Plus::seed_from_u64(8);
    let ds = sparse_regression(40, &array![3.0, 0.0, 0.0, -2.0, 0.0, 0.0], 1.0, &mut rng);
    let path = LarParams::new().max_steps(3).fit(&ds).unwrap();
    assert!(!path.completepath());

    let inference = InferenceParams::new().sigma(Some(1.0)).infer(&path).unwrap();
    assert_eq!(inference.pv().len(), 3);
    assert!(inference.pv_spacing().iter().all(Option::is_some));
    assert!(inference.pv_asymptotic()[..2].iter().all(Option::is_some));
    assert!(inference.pv_covtest()[..2].iter().all(Option::is_some));
    assert_eq!(inference.pv_asymptotic()[2], None);
    assert_eq!(inference.pv_covtest()[2], None);

    let all = InferenceParams::new()
        .sigma(Some(1.0))
        .mode(InferenceMode::All)
        .k(Some(4))
        .infer(&path);
    assert!(matches!(all, Err(InferenceError::InsufficientPath { .. })));
}

#[test]
fn noise_level_estimates() {
    let mut rng = Xoshiro256Plus::seed_from_u64(21);
    let ds = sparse_regression(200, &array![1.0, 0.0, -1.0, 0.0], 2.0, &mut rng);
    let path = LarParams::new().fit(&ds).unwrap();
    let sigma = estimate_sigma(&path).unwrap();
    assert!((sigma - 2.0).abs() < 0.4);
    let inference = InferenceParams::new().infer(&path).unwrap();
    assert_abs_diff_eq!(*inference.sigma(), sigma);

    // more features than half the samples, fall back to the deviation of the targets
    let x = standardize_columns(&gaussian_design(10, 8, &mut rng));
    let y = null_response(10, 1.0, &mut rng);
    let path = LarParams::new().fit(&Dataset::new(x, y.clone())).unwrap();
    assert_abs_diff_eq!(estimate_sigma(&path).unwrap(), y.std(1.0), epsilon = 1e-12);
}

#[test]
fn invalid_parameters_are_reported() {
    let path = two_signal_path(1);
    assert!(matches!(
        InferenceParams::new().alpha(2.0).infer(&path),
        Err(InferenceError::InvalidAlpha(_))
    ));
    assert!(matches!(
        InferenceParams::new().sigma(Some(-1.0)).infer(&path),
        Err(InferenceError::InvalidSigma(_))
    ));
    assert!(matches!(
        InferenceParams::new().k(Some(0)).infer(&path),
        Err(InferenceError::InvalidStep)
    ));
}

#[test]
fn first_step_pvalue_is_uniform_under_the_null() {
    let mut rng = Xoshiro256Plus::seed_from_u64(2024);
    let x = standardize_columns(&gaussian_design(30, 5, &mut rng));
    let params = InferenceParams::new()
        .sigma(Some(1.0))
        .k(Some(1))
        .grid_points(100);

    let reps = 400;
    let pvalues: Vec<f64> = (0..reps)
        .map(|_| {
            let y = null_response(30, 1.0, &mut rng);
            let path = LarParams::new().fit(&Dataset::new(x.clone(), y)).unwrap();
            params.infer(&path).unwrap().pv()[0]
        })
        .collect();

    let mean = pvalues.iter().sum::<f64>() / reps as f64;
    let small = pvalues.iter().filter(|&&pv| pv < 0.1).count() as f64 / reps as f64;
    assert!((mean - 0.5).abs() < 0.07, "mean p-value {}", mean);
    assert!((small - 0.1).abs() < 0.05, "rejection rate {}", small);
}
