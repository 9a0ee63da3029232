use ndarray::array;
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use selinf::prelude::*;
use selinf_datasets::generate::sparse_regression;
use selinf_lar::LarParams;

fn main() -> std::result::Result<(), selinf_lar::LarError> {
    // two strong signals among eight variables
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let beta = array![3.0, 0.0, 0.0, -2.0, 0.0, 0.0, 0.0, 0.0];
    let dataset = sparse_regression(60, &beta, 1.0, &mut rng);

    let path = LarParams::new().fit(&dataset)?;

    println!("complete path: {}", path.completepath());
    for (k, (&variable, lambda)) in path.actions().iter().zip(path.lambdas()).enumerate() {
        println!(
            "step {:>2}: variable {} entered with sign {:+} at lambda {:.4}",
            k + 1,
            variable,
            path.signs()[k],
            lambda
        );
    }

    if let Some(bls) = path.bls() {
        println!("least squares refit: {:.3}", bls);
    }
    let halfway = path.lambdas()[0] / 2.0;
    println!("coefficients at lambda {:.4}: {:.3}", halfway, path.coef_at_lambda(halfway)?);
    println!(
        "selection event described by {} linear constraints",
        path.constraints().gamma().nrows()
    );

    Ok(())
}
