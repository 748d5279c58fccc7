use perturbrust_core::{
    BigComplex, Complex, Fractal, FamilyId, FractalParams, Newton, NewtonPolynomial,
};

/// The double-precision and arbitrary-precision Mandelbrot loops must agree
/// on integer iteration counts across a low-zoom grid.
#[test]
fn double_and_arbitrary_agree_on_grid() {
    let params = FractalParams {
        max_iterations: 500,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();

    let (x0, x1) = (-2.5, 1.0);
    let (y0, y1) = (-1.25, 1.25);
    let steps = 32;

    let mut mismatches = Vec::new();
    for j in 0..steps {
        for i in 0..steps {
            let c = Complex::new(
                x0 + (x1 - x0) * i as f64 / (steps - 1) as f64,
                y0 + (y1 - y0) * j as f64 / (steps - 1) as f64,
            );
            let double = fractal.iterate(c);
            let arbitrary = fractal.iterate_arbitrary(&BigComplex::from_complex(c, 50));
            if double.class() != arbitrary.class() {
                mismatches.push((c, double.class(), arbitrary.class()));
            }
        }
    }
    assert!(
        mismatches.is_empty(),
        "double vs arbitrary mismatches: {mismatches:?}"
    );
}

/// S1: c = 0 never escapes.
#[test]
fn scenario_origin_is_interior() {
    let params = FractalParams {
        max_iterations: 100,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();
    let r = fractal.iterate(Complex::ZERO);
    assert_eq!(r.iterations, 100);
    assert!(!r.escaped);
}

/// S2: c = 1 escapes at n = 2 (the escape test runs after the update, and
/// |z|² = 4 at z = 2 does not exceed bailout² = 4).
#[test]
fn scenario_unit_c_escapes_at_two() {
    let params = FractalParams {
        max_iterations: 100,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();
    let r = fractal.iterate(Complex::new(1.0, 0.0));
    assert!(r.escaped);
    assert_eq!(r.iterations, 2);
}

/// S3: interior checking returns early for a cardioid point — the final
/// iterate is still z₀ because the loop never ran.
#[test]
fn scenario_cardioid_early_return() {
    let params = FractalParams {
        max_iterations: 1000,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();
    let r = fractal.iterate(Complex::new(-0.5, 0.0));
    assert!(!r.escaped);
    assert_eq!(r.iterations, 1000);
    assert_eq!(r.final_z, Complex::ZERO, "the kernel must skip the loop");
}

/// Property 7: every sampled point of the cardioid and the period-2 bulb
/// reports interior.
#[test]
fn interior_test_covers_cardioid_and_bulb() {
    let params = FractalParams {
        max_iterations: 2000,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();

    // Points safely inside the cardioid (r < ½(1 − cos θ) in its polar
    // form) and inside the bulb of radius ¼ around −1.
    let samples = [
        Complex::new(0.0, 0.0),
        Complex::new(-0.4, 0.2),
        Complex::new(0.2, 0.1),
        Complex::new(-0.5, -0.3),
        Complex::new(-1.0, 0.0),
        Complex::new(-1.1, 0.1),
        Complex::new(-0.9, -0.15),
    ];
    for &c in &samples {
        let r = fractal.iterate(c);
        assert!(!r.escaped, "{c} should be interior");
        assert_eq!(r.iterations, 2000);
    }
}

/// S4: the Douady rabbit parameter keeps the origin bounded.
#[test]
fn scenario_douady_rabbit() {
    let params = FractalParams {
        max_iterations: 500,
        julia_mode: true,
        julia_c: Complex::new(-0.123, 0.745),
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();
    let r = fractal.iterate(Complex::ZERO);
    assert!(!r.escaped);
    assert_eq!(r.iterations, 500);
}

/// S5: Newton's method from z₀ = 1 on z³ − 1 is already converged.
#[test]
fn scenario_newton_cubic_from_one() {
    let newton = Newton::new(
        FractalParams::default(),
        NewtonPolynomial::Cubic,
        Complex::ONE,
        false,
        1e-6,
    )
    .unwrap();
    let r = newton.iterate(Complex::ONE);
    assert!(!r.escaped);
    assert!(r.iterations <= 3);
    assert_eq!(r.root_index, Some(0));
    assert!((r.final_z - Complex::ONE).norm() < 1e-6);
}

/// S6: c = −1.76 is on the Burning Ship's main body.
#[test]
fn scenario_burning_ship_main_body() {
    let params = FractalParams {
        max_iterations: 1000,
        ..FractalParams::default()
    };
    let fractal = Fractal::from_id(FamilyId::BurningShip, params).unwrap();
    let r = fractal.iterate(Complex::new(-1.76, 0.0));
    assert!(!r.escaped);
    assert_eq!(r.iterations, 1000);
}

/// Results are pure functions of their inputs across the whole dispatcher.
#[test]
fn dispatcher_is_deterministic() {
    for id in [
        FamilyId::Mandelbrot,
        FamilyId::Julia,
        FamilyId::BurningShip,
        FamilyId::Tricorn,
        FamilyId::Newton,
        FamilyId::Phoenix,
        FamilyId::Custom,
    ] {
        let fractal = Fractal::from_id(id, FractalParams::default()).unwrap();
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(0.5, 0.5),
            Complex::new(-1.2, 0.4),
        ];
        let run1: Vec<_> = points.iter().map(|&p| fractal.compute(p)).collect();
        let run2: Vec<_> = points.iter().map(|&p| fractal.compute(p)).collect();
        assert_eq!(run1, run2, "{id:?} must be deterministic");
    }
}
