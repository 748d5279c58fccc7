use crate::complex::Complex;
use crate::formula::{compile, CompiledFormula};
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// A user-formula fractal: the inner step evaluates a parsed AST with the
/// environment `{z, c, p, n}`.
///
/// Evaluation failures (division by zero, non-finite values) abort the
/// sample: the result carries the iterations completed so far with
/// `escaped = false`.
#[derive(Debug, Clone)]
pub struct Custom {
    params: FractalParams,
    formula: CompiledFormula,
}

impl Custom {
    pub fn new(formula: &str, params: FractalParams) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self {
            params,
            formula: compile(formula)?,
        })
    }

    pub fn from_compiled(formula: CompiledFormula, params: FractalParams) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params, formula })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn formula(&self) -> &CompiledFormula {
        &self.formula
    }

    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let (z0, c) = if p.julia_mode {
            (point, p.julia_c)
        } else {
            (Complex::ZERO, point)
        };

        let bailout_sq = p.bailout_sq();
        let power = self.formula.power();
        let mut z = z0;
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..p.max_iterations {
            match self.formula.eval(z, c, point, n as f64) {
                Ok(next) => z = next,
                Err(_) => {
                    // Abort the sample: iterations so far, not escaped.
                    let mut result = IterationResult {
                        iterations: n,
                        smooth: n as f64,
                        escaped: false,
                        final_z: z,
                        final_norm_sq: z.norm_sq(),
                        ..IterationResult::default()
                    };
                    acc.apply(&mut result);
                    return result;
                }
            }
            acc.update(z);

            let norm_sq = z.norm_sq();
            if norm_sq > bailout_sq {
                return escape_result(p, n, z, None, power, &acc);
            }
        }

        interior_result(p, z, &acc)
    }
}
