use ndarray::array;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use selinf::prelude::*;
use selinf_datasets::generate::sparse_regression;
use selinf_inference::{InferenceMode, InferenceParams};
use selinf_lar::LarParams;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // two signals among ten variables, the noise level is estimated from the residuals
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let beta = array![0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, -3.0, 0.0, 0.0];
    let dataset = sparse_regression(50, &beta, 1.0, &mut rng);

    let path = LarParams::new().fit(&dataset)?;
    let inference = InferenceParams::new().alpha(0.1).infer(&path)?;

    println!("estimated sigma: {:.3}", inference.sigma());
    println!("step  var     p-value        90% interval      spacing  covtest");
    for (j, &var) in inference.vars().iter().enumerate() {
        println!(
            "{:>4} {:>4} {:>11.4e}  [{:>8.3}, {:>8.3}]  {:>7.4}  {:>7.4}",
            j + 1,
            var,
            inference.pv()[j],
            inference.ci()[[j, 0]],
            inference.ci()[[j, 1]],
            inference.pv_spacing()[j].unwrap_or(f64::NAN),
            inference.pv_covtest()[j].unwrap_or(f64::NAN),
        );
    }
    println!("ForwardStop: {:?} steps", inference.khat());

    let aic = InferenceParams::new()
        .mode(InferenceMode::Aic)
        .infer(&path)?;
    println!(
        "AIC selects {:?} steps, tested variables {:?} with p-values {:.4}",
        aic.khat(),
        aic.vars(),
        aic.pv()
    );

    Ok(())
}
