use criterion::{criterion_group, criterion_main, Criterion};

use perturbrust_core::{Complex, FamilyId, Fractal, FractalParams, PrecisionMode, Viewport};
use perturbrust_engine::{
    compute_grid, compute_reference, iterate_perturbation, Engine, GridCancel, GLITCH_TOLERANCE,
};

fn bench_plain_grid(c: &mut Criterion) {
    let engine = Engine::new(
        Fractal::from_id(
            FamilyId::Mandelbrot,
            FractalParams {
                max_iterations: 1000,
                ..FractalParams::default()
            },
        )
        .unwrap(),
    );
    let viewport = Viewport::new(Complex::new(-0.5, 0.0), 0.005, 256, 256).unwrap();
    let cancel = GridCancel::new();

    c.bench_function("plain_grid_256x256_1000iter", |b| {
        b.iter(|| compute_grid(&engine, &viewport, &cancel));
    });
}

fn bench_perturbation_pixel(c: &mut Criterion) {
    let fractal = Fractal::from_id(
        FamilyId::Mandelbrot,
        FractalParams {
            max_iterations: 2000,
            ..FractalParams::default()
        },
    )
    .unwrap();
    let orbit = compute_reference(&fractal, "-0.75", "0.1", 60).unwrap();

    c.bench_function("perturbation_pixel_2000iter", |b| {
        b.iter(|| {
            iterate_perturbation(
                &fractal,
                &orbit,
                Complex::new(1e-5, -2e-5),
                None,
                GLITCH_TOLERANCE,
            )
        });
    });
}

fn bench_hybrid_grid(c: &mut Criterion) {
    let params = FractalParams {
        max_iterations: 1000,
        precision_mode: PrecisionMode::Perturbation,
        precision: 60,
        ..FractalParams::default()
    };
    let mut engine =
        Engine::new(Fractal::from_id(FamilyId::Mandelbrot, params).unwrap());
    engine
        .initialize_perturbation("-0.5", "0.1", 60)
        .unwrap();
    engine.compute_reference_orbit().unwrap();
    engine.compute_series(16).unwrap();
    let viewport = Viewport::new(Complex::ZERO, 1e-9, 128, 128).unwrap();
    let cancel = GridCancel::new();

    c.bench_function("hybrid_grid_128x128", |b| {
        b.iter(|| compute_grid(&engine, &viewport, &cancel));
    });
}

criterion_group!(
    benches,
    bench_plain_grid,
    bench_perturbation_pixel,
    bench_hybrid_grid
);
criterion_main!(benches);
