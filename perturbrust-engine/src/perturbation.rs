use perturbrust_core::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use perturbrust_core::{BigComplex, BigDecimal, Complex, Fractal, IterationResult};

use crate::reference::ReferenceOrbit;

/// Glitch tolerance τ for the direct perturbation paths: the approximation
/// is declared broken when `|δ|² > τ·|Z|²`.
pub const GLITCH_TOLERANCE: f64 = 1e-8;

/// Looser τ used by the hybrid (series + perturbation) path.
pub const GLITCH_TOLERANCE_HYBRID: f64 = 1e-4;

/// Below this `|Z|²` the glitch ratio test is meaningless (the reference
/// passes through the origin) and is skipped.
const GLITCH_FLOOR_SQ: f64 = 1e-20;

/// Where the delta iteration starts: iterate index and the delta there.
/// The hybrid path hands over the state found by series approximation.
#[derive(Debug, Clone, Copy)]
pub struct Start {
    pub n: u32,
    pub delta: Complex,
}

/// The per-family delta recurrence, resolved once per pixel so the loop
/// stays monomorphic.
enum DeltaKernel {
    /// `δ′ = 2Z·δ + δ² [+ δc]` — Mandelbrot, and Julia without the `+δc`.
    Standard { delta_c_term: bool },
    /// `δ′ = 2·conj(Z)·conj(δ) + conj(δ)² + δc`.
    Tricorn { delta_c_term: bool },
    /// Sign-masked linear form over the folded components, sign-checked
    /// against the reference each step.
    BurningShip,
    /// Two-step history: `δ′ = 2Z·δ + δ² + p·δ₋₁ [+ δc]`, with the Ushiki
    /// variant's cross terms when the parameter is folded into `c`.
    Phoenix {
        p: Complex,
        ushiki: bool,
        delta_c_term: bool,
    },
}

impl DeltaKernel {
    fn for_fractal(fractal: &Fractal, orbit: &ReferenceOrbit) -> Self {
        let delta_c_term = !orbit.julia();
        match fractal {
            Fractal::Tricorn(_) => Self::Tricorn { delta_c_term },
            Fractal::BurningShip(_) => Self::BurningShip,
            Fractal::Phoenix(ph) => Self::Phoenix {
                p: ph.p(),
                ushiki: ph.ushiki(),
                delta_c_term,
            },
            _ => Self::Standard { delta_c_term },
        }
    }

    fn has_history(&self) -> bool {
        matches!(self, Self::Phoenix { .. })
    }
}

fn sign_of(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Iterate one pixel by propagating its delta against the reference orbit.
///
/// `delta_c` is the pixel's offset from the reference centre. On glitch the
/// pixel falls back to plain double-precision iteration from the current
/// full iterate; if even that cannot distinguish the pixel from the
/// reference, it is promoted to the arbitrary-precision loop. The returned
/// result never signals an error.
pub fn iterate_perturbation(
    fractal: &Fractal,
    orbit: &ReferenceOrbit,
    delta_c: Complex,
    start: Option<Start>,
    tau: f64,
) -> IterationResult {
    let params = *fractal.params();
    let len = orbit.len();
    if len == 0 {
        return IterationResult::degenerate();
    }

    let kernel = DeltaKernel::for_fractal(fractal, orbit);
    let bailout_sq = orbit.bailout_sq();
    let max_iter = params.max_iterations;
    let mut acc = OrbitAccumulator::new(&params);

    let (start_n, start_delta) = match start {
        Some(s) => (s.n, s.delta),
        // δ₀ is the pixel offset when z₀ sweeps the plane, zero otherwise.
        None => (0, if orbit.julia() { delta_c } else { Complex::ZERO }),
    };

    let mut n = start_n;
    let mut m = start_n as usize;
    if m >= len {
        // The skip point exceeds the reference; restart from scratch in the
        // fallback, flagged glitched.
        let z0 = if orbit.julia() {
            orbit.c_f64() + delta_c
        } else {
            Complex::ZERO
        };
        return fallback(fractal, orbit, delta_c, z0, Complex::ZERO, 0, true, acc);
    }
    let mut delta = start_delta;
    let mut delta_prev = Complex::ZERO;
    let mut z = orbit.z[m] + delta;
    // Full previous iterate, kept for the Phoenix fallback handover.
    let mut prev_full = if m > 0 {
        orbit.z[m - 1] + delta_prev
    } else {
        Complex::ZERO
    };

    while n < max_iter {
        // Pauldelbrot-style breakdown test: δ has grown to the order of Z.
        let z_ref_norm_sq = orbit.z_norm_sq[m];
        if z_ref_norm_sq > GLITCH_FLOOR_SQ && delta.norm_sq() > tau * z_ref_norm_sq {
            return fallback(fractal, orbit, delta_c, z, prev_full, n, true, acc);
        }

        if let DeltaKernel::BurningShip = kernel {
            // The fold is not differentiable across the axes: any sign
            // disagreement between the reference and the perturbed iterate
            // invalidates the masked recurrence immediately.
            let (s_re, s_im) = orbit.signs[m];
            if sign_of(z.re) != s_re || sign_of(z.im) != s_im {
                return fallback(fractal, orbit, delta_c, z, prev_full, n, true, acc);
            }
        }

        // Zhuoran rebase: when the full iterate is smaller than the delta,
        // re-express the pixel against the orbit start. Also retires pixels
        // that outlive an escaped reference.
        if m > 0 && !kernel.has_history() && z.norm_sq() < delta.norm_sq() {
            delta = z - orbit.z[0];
            m = 0;
            continue;
        }

        if m + 1 >= len {
            // Next reference iterate unavailable (reference escaped, or a
            // skip landed on the final entry): finish in plain arithmetic.
            return fallback(fractal, orbit, delta_c, z, prev_full, n, false, acc);
        }

        // Advance the delta using Zₙ, then form the next full iterate.
        let next_delta = match kernel {
            DeltaKernel::Standard { delta_c_term } => {
                let mut d = orbit.two_z[m] * delta + delta.square();
                if delta_c_term {
                    d += delta_c;
                }
                d
            }
            DeltaKernel::Tricorn { delta_c_term } => {
                let conj = delta.conj();
                let mut d = orbit.two_z[m] * conj + conj.square();
                if delta_c_term {
                    d += delta_c;
                }
                d
            }
            // Sign-masked linear form; the stored two_z components are the
            // folded `2|Re Z|, 2|Im Z|`, so this is one complex multiply.
            DeltaKernel::BurningShip => orbit.two_z[m] * delta + delta_c,
            DeltaKernel::Phoenix {
                p,
                ushiki,
                delta_c_term,
            } => {
                let mut d = orbit.two_z[m] * delta + delta.square();
                if ushiki {
                    if delta_c_term {
                        let prev_ref = if m > 0 { orbit.z[m - 1] } else { Complex::ZERO };
                        d += Complex::new(delta_c.re, 0.0);
                        d += delta_prev * orbit.c_f64().im;
                        d += (prev_ref + delta_prev) * delta_c.im;
                    } else {
                        d += delta_prev * fractal.params().julia_c.im;
                    }
                } else {
                    d += p * delta_prev;
                    if delta_c_term {
                        d += delta_c;
                    }
                }
                d
            }
        };

        prev_full = z;
        delta_prev = delta;
        delta = next_delta;
        m += 1;
        n += 1;
        z = orbit.z[m] + delta;
        acc.update(z);

        if z.norm_sq() > bailout_sq {
            let mut result = escape_result(&params, n - 1, z, None, 2.0, &acc);
            result.perturbation_used = true;
            return result;
        }
    }

    let mut result = interior_result(&params, z, &acc);
    result.perturbation_used = true;
    result
}

/// The fallback ladder of §glitch policy: plain double-precision iteration
/// from the current full iterate, promoted to arbitrary precision when the
/// pixel's parameter is not representable apart from the reference's in
/// `f64`.
#[allow(clippy::too_many_arguments)]
fn fallback(
    fractal: &Fractal,
    orbit: &ReferenceOrbit,
    delta_c: Complex,
    z: Complex,
    prev: Complex,
    n_done: u32,
    glitched: bool,
    mut acc: OrbitAccumulator,
) -> IterationResult {
    let c_full = if orbit.julia() {
        julia_constant(fractal)
    } else {
        orbit.c_f64() + delta_c
    };

    // Double precision cannot separate this pixel from the reference centre:
    // go straight to the high-precision loop.
    let indistinct = !orbit.julia() && delta_c != Complex::ZERO && c_full == orbit.c_f64();
    if indistinct {
        return fallback_arbitrary(fractal, orbit, delta_c, z, prev, n_done, glitched, &mut acc);
    }

    match fallback_plain(fractal, c_full, z, prev, n_done, glitched, &mut acc) {
        Some(result) => result,
        None => fallback_arbitrary(fractal, orbit, delta_c, z, prev, n_done, glitched, &mut acc),
    }
}

fn julia_constant(fractal: &Fractal) -> Complex {
    match fractal {
        Fractal::Julia(j) => j.c(),
        _ => fractal.params().julia_c,
    }
}

/// Continue the family recurrence in plain `f64` from `z`. Returns `None`
/// when the iteration meets a non-finite value, signalling promotion.
fn fallback_plain(
    fractal: &Fractal,
    c: Complex,
    mut z: Complex,
    mut prev: Complex,
    n_done: u32,
    glitched: bool,
    acc: &mut OrbitAccumulator,
) -> Option<IterationResult> {
    let params = fractal.params();
    let bailout_sq = params.bailout_sq();

    for n in n_done..params.max_iterations {
        let next = plain_step(fractal, z, prev, c);
        prev = z;
        z = next;
        if !z.is_finite() {
            return None;
        }
        acc.update(z);

        if z.norm_sq() > bailout_sq {
            let mut result = escape_result(params, n, z, None, 2.0, acc);
            result.perturbation_used = true;
            result.glitched = glitched;
            return Some(result);
        }
    }

    let mut result = interior_result(params, z, acc);
    result.perturbation_used = true;
    result.glitched = glitched;
    Some(result)
}

fn plain_step(fractal: &Fractal, z: Complex, prev: Complex, c: Complex) -> Complex {
    match fractal {
        Fractal::Mandelbrot(_) | Fractal::Julia(_) => z.square() + c,
        Fractal::Tricorn(_) => z.conj().square() + c,
        Fractal::BurningShip(_) => Complex::new(
            z.re * z.re - z.im * z.im + c.re,
            2.0 * (z.re * z.im).abs() + c.im,
        ),
        Fractal::Phoenix(ph) => {
            if ph.ushiki() {
                Complex::new(z.re * z.re - z.im * z.im + c.re, 2.0 * z.re * z.im)
                    + prev * c.im
            } else {
                z.square() + c + ph.p() * prev
            }
        }
        Fractal::Newton(_) | Fractal::Custom(_) => unreachable!("no perturbation support"),
    }
}

/// Last rung of the ladder: iterate at full precision from the glitch
/// point, with the pixel's exact parameter `center + δc`.
#[allow(clippy::too_many_arguments)]
fn fallback_arbitrary(
    fractal: &Fractal,
    orbit: &ReferenceOrbit,
    delta_c: Complex,
    z: Complex,
    prev: Complex,
    n_done: u32,
    glitched: bool,
    acc: &mut OrbitAccumulator,
) -> IterationResult {
    let params = fractal.params();
    let precision = orbit.center().precision();
    let bailout_sq = BigDecimal::from_f64(params.bailout_sq(), precision);

    let c_big = if orbit.julia() {
        BigComplex::from_complex(julia_constant(fractal), precision)
    } else {
        let offset = BigComplex::from_complex(delta_c, precision);
        orbit.center() + &offset
    };
    let mut z_big = BigComplex::from_complex(z, precision);
    let mut prev_big = BigComplex::from_complex(prev, precision);

    for n in n_done..params.max_iterations {
        let next = ReferenceOrbit::step(fractal, &z_big, &prev_big, &c_big);
        prev_big = z_big;
        z_big = next;
        let z_f64 = z_big.to_complex();
        acc.update(z_f64);

        if z_big.escaped(&bailout_sq) {
            let mut result = escape_result(params, n, z_f64, None, 2.0, acc);
            result.final_norm_sq = z_big.norm_sq().to_f64();
            result.perturbation_used = true;
            result.glitched = glitched;
            return result;
        }
    }

    let mut result = interior_result(params, z_big.to_complex(), acc);
    result.perturbation_used = true;
    result.glitched = glitched;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::compute_reference;
    use perturbrust_core::{FamilyId, FractalParams};

    fn mandelbrot(max_iterations: u32) -> Fractal {
        Fractal::from_id(
            FamilyId::Mandelbrot,
            FractalParams {
                max_iterations,
                ..FractalParams::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn zero_delta_matches_reference_fate() {
        let f = mandelbrot(300);
        let orbit = compute_reference(&f, "-0.5", "0", 60).unwrap();
        let r = iterate_perturbation(&f, &orbit, Complex::ZERO, None, GLITCH_TOLERANCE);
        assert!(!r.escaped);
        assert!(r.perturbation_used);
        assert_eq!(r.iterations, 300);
    }

    #[test]
    fn small_deltas_match_plain_iteration() {
        let f = mandelbrot(500);
        let orbit = compute_reference(&f, "-0.75", "0.1", 60).unwrap();
        let deltas = [
            Complex::new(1e-4, 0.0),
            Complex::new(-2e-4, 1e-4),
            Complex::new(5e-5, -8e-5),
            Complex::new(-1e-4, -1e-4),
            Complex::new(3e-4, 2e-4),
        ];
        for &dc in &deltas {
            let perturbed = iterate_perturbation(&f, &orbit, dc, None, GLITCH_TOLERANCE);
            let plain = f.iterate(Complex::new(-0.75, 0.1) + dc);
            assert!(
                perturbed.class() == plain.class() || perturbed.glitched,
                "delta {dc}: perturbation {} vs plain {}",
                perturbed.iterations,
                plain.iterations
            );
        }
    }

    #[test]
    fn escaping_pixel_reports_escape() {
        let f = mandelbrot(200);
        let orbit = compute_reference(&f, "-0.5", "0", 60).unwrap();
        // A delta big enough to land outside the set; the glitch test will
        // retire it through the fallback, which still produces the right
        // escape.
        let r = iterate_perturbation(&f, &orbit, Complex::new(1.6, 0.0), None, GLITCH_TOLERANCE);
        assert!(r.escaped);
        let plain = f.iterate(Complex::new(1.1, 0.0));
        assert_eq!(r.class(), plain.class());
    }

    #[test]
    fn escaped_reference_still_serves_interior_pixels() {
        // The reference at (−0.75, 0.1) escapes; a nearby pixel on the set
        // must still be iterated to max via rebasing or fallback.
        let f = mandelbrot(400);
        let orbit = compute_reference(&f, "-0.75", "0.1", 60).unwrap();
        assert!(orbit.escaped(), "test premise: reference escapes");
        // Pull toward the period-2 bulb, which is interior.
        let dc = Complex::new(-0.05, -0.09);
        let r = iterate_perturbation(&f, &orbit, dc, None, GLITCH_TOLERANCE);
        let plain = f.iterate(Complex::new(-0.80, 0.01));
        assert_eq!(r.class(), plain.class());
    }

    #[test]
    fn julia_mode_delta_is_z_offset() {
        let f = Fractal::from_id(
            FamilyId::Julia,
            FractalParams {
                max_iterations: 300,
                ..FractalParams::default()
            },
        )
        .unwrap();
        let orbit = compute_reference(&f, "0.05", "0.05", 60).unwrap();
        let dc = Complex::new(1e-4, -1e-4);
        let perturbed = iterate_perturbation(&f, &orbit, dc, None, GLITCH_TOLERANCE);
        let plain = f.iterate(Complex::new(0.05, 0.05) + dc);
        assert!(perturbed.class() == plain.class() || perturbed.glitched);
    }

    #[test]
    fn burning_ship_sign_flip_glitches() {
        let params = FractalParams {
            max_iterations: 300,
            ..FractalParams::default()
        };
        let f = Fractal::from_id(FamilyId::BurningShip, params).unwrap();
        // Reference very close to the imaginary axis: tiny deltas flip the
        // sign of Re z early in the orbit.
        let orbit = compute_reference(&f, "0.0000001", "-0.6", 60).unwrap();
        let dc = Complex::new(-0.0000005, 0.0);
        let r = iterate_perturbation(&f, &orbit, dc, None, GLITCH_TOLERANCE);
        // The pixel must come back well-formed, through the fallback.
        let plain = f.iterate(orbit.c_f64() + dc);
        assert_eq!(r.class(), plain.class());
    }

    #[test]
    fn phoenix_history_perturbation_matches_plain() {
        let params = FractalParams {
            max_iterations: 300,
            julia_mode: true,
            julia_c: Complex::new(0.5667, 0.0),
            ..FractalParams::default()
        };
        let f = Fractal::Phoenix(
            perturbrust_core::Phoenix::new(params, Complex::new(-0.5, 0.0), false).unwrap(),
        );
        let orbit = compute_reference(&f, "0.01", "0.02", 60).unwrap();
        for &dc in &[Complex::new(1e-5, 0.0), Complex::new(-2e-5, 1e-5)] {
            let perturbed = iterate_perturbation(&f, &orbit, dc, None, GLITCH_TOLERANCE);
            let plain = f.iterate(Complex::new(0.01, 0.02) + dc);
            assert!(
                perturbed.class() == plain.class() || perturbed.glitched,
                "phoenix delta {dc}"
            );
        }
    }

    #[test]
    fn oversized_start_index_degrades_cleanly() {
        let f = mandelbrot(100);
        let orbit = compute_reference(&f, "1", "1", 60).unwrap();
        let r = iterate_perturbation(
            &f,
            &orbit,
            Complex::new(1e-6, 0.0),
            Some(Start {
                n: 10_000,
                delta: Complex::ZERO,
            }),
            GLITCH_TOLERANCE,
        );
        assert!(r.glitched);
        assert!(r.iterations <= 100);
    }
}
