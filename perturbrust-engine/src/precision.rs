use perturbrust_core::{Capabilities, PrecisionMode};

/// Zoom factor past which plain `f64` can no longer separate adjacent
/// pixels (≈15 significant digits minus screen resolution).
pub const PERTURBATION_THRESHOLD: f64 = 1e13;

/// Working precision for a reference orbit at the given zoom:
/// `max(50, ⌈log₁₀ zoom⌉ + 20)` decimal digits. The 20-digit margin keeps
/// the orbit stable well past the per-pixel delta scale.
pub fn recommended_precision(zoom: f64) -> usize {
    let digits = zoom.max(1.0).log10().ceil() as usize + 20;
    digits.max(50)
}

/// True when the view is deep enough that the perturbation machinery pays
/// for itself (and plain doubles stop working).
pub fn should_use_perturbation(zoom: f64) -> bool {
    zoom > PERTURBATION_THRESHOLD
}

/// Pick the numeric path for a zoom level given what the family offers.
/// Deep views prefer perturbation, then arbitrary precision, then double
/// as the last resort.
pub fn recommended_mode(zoom: f64, capabilities: Capabilities) -> PrecisionMode {
    if !should_use_perturbation(zoom) {
        return PrecisionMode::Double;
    }
    if capabilities.supports_perturbation {
        PrecisionMode::Perturbation
    } else if capabilities.supports_arbitrary_precision {
        PrecisionMode::Arbitrary
    } else {
        PrecisionMode::Double
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perturbrust_core::{descriptor, FamilyId};

    #[test]
    fn precision_floors_at_fifty() {
        assert_eq!(recommended_precision(1.0), 50);
        assert_eq!(recommended_precision(1e10), 50);
    }

    #[test]
    fn precision_tracks_zoom() {
        assert_eq!(recommended_precision(1e40), 60);
        assert_eq!(recommended_precision(1e100), 120);
    }

    #[test]
    fn perturbation_threshold() {
        assert!(!should_use_perturbation(1e12));
        assert!(should_use_perturbation(1e14));
    }

    #[test]
    fn mode_selection_follows_capabilities() {
        let mandelbrot = descriptor(FamilyId::Mandelbrot).capabilities;
        let newton = descriptor(FamilyId::Newton).capabilities;
        assert_eq!(recommended_mode(1.0, mandelbrot), PrecisionMode::Double);
        assert_eq!(
            recommended_mode(1e20, mandelbrot),
            PrecisionMode::Perturbation
        );
        assert_eq!(recommended_mode(1e20, newton), PrecisionMode::Double);
    }
}
