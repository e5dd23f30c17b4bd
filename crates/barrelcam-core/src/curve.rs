//! Sampled curves over one full revolution.

use barrelcam_math::grid_index;

use crate::error::{CamError, Result};
use crate::law::MotionLaw;
use crate::point::FULL_TURN;
use crate::segment::{CurveKind, Segment};

/// One sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Angle in degrees.
    pub angle: f64,
    /// Sampled quantity.
    pub value: f64,
}

/// Lazily sampled curve spanning 0 to 360 degrees.
///
/// Owns the solved segments and can be iterated any number of times. The
/// last sample is always at exactly 360 degrees.
#[derive(Debug, Clone)]
pub struct Curve {
    segments: Vec<Segment>,
    kind: CurveKind,
    complete: bool,
    steps: u32,
    scale: f64,
    slope_radius: Option<f64>,
}

impl Curve {
    pub(crate) fn new(segments: Vec<Segment>, kind: CurveKind, complete: bool, steps: u32) -> Self {
        Self {
            segments,
            kind,
            complete,
            steps,
            scale: 1.0,
            slope_radius: None,
        }
    }

    /// Multiply every sampled value by `factor`.
    pub fn scaled(mut self, factor: f64) -> Self {
        self.scale *= factor;
        self
    }

    /// Map values to the slope of the unrolled track in degrees,
    /// `atan(value / radius)`.
    ///
    /// Meant for first-derivative curves: displacement per radian over the
    /// drum radius is the rise per mm of arc.
    pub fn slope_angle(mut self, radius: f64) -> Self {
        self.slope_radius = Some(radius);
        self
    }

    /// Quantity carried by the curve.
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Samples per degree.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Whether dwell segments are fully sampled.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Solved segments in angular order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Iterate the samples.
    pub fn iter(&self) -> CurveIter<'_> {
        CurveIter {
            curve: self,
            segment: 0,
            cursor: None,
            closed: false,
        }
    }

    /// Largest absolute sampled value.
    pub fn peak(&self) -> f64 {
        self.iter().map(|s| s.value.abs()).fold(0.0, f64::max)
    }

    /// Collect every sample.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().collect()
    }

    fn closing_sample(&self) -> Sample {
        let value = match self.segments.last() {
            Some(last) => match self.kind {
                CurveKind::Displacement => last.end.y,
                kind => last.function.evaluate(kind, FULL_TURN),
            },
            None => 0.0,
        };
        Sample {
            angle: FULL_TURN,
            value: self.finish(value),
        }
    }

    fn finish(&self, raw: f64) -> f64 {
        let value = raw * self.scale;
        match self.slope_radius {
            Some(radius) => (value / radius).atan().to_degrees(),
            None => value,
        }
    }

    fn sparse(&self, segment: &Segment) -> bool {
        !self.complete && self.kind == CurveKind::Displacement && segment.law == MotionLaw::Linear
    }
}

impl<'a> IntoIterator for &'a Curve {
    type Item = Sample;
    type IntoIter = CurveIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the samples of a [`Curve`].
#[derive(Debug, Clone)]
pub struct CurveIter<'a> {
    curve: &'a Curve,
    segment: usize,
    cursor: Option<i64>,
    closed: bool,
}

impl Iterator for CurveIter<'_> {
    type Item = Sample;

    fn next(&mut self) -> Option<Sample> {
        let curve = self.curve;
        let steps = curve.steps;
        while let Some(segment) = curve.segments.get(self.segment) {
            if curve.sparse(segment) {
                // a dwell only contributes its start point
                if self.cursor.is_none() {
                    self.cursor = Some(0);
                    return Some(Sample {
                        angle: segment.start.x,
                        value: curve.finish(segment.start.y),
                    });
                }
            } else {
                let end = grid_index(segment.end.x, steps);
                let i = *self
                    .cursor
                    .get_or_insert_with(|| grid_index(segment.start.x, steps));
                if i < end {
                    self.cursor = Some(i + 1);
                    let split = segment
                        .function
                        .split()
                        .map_or(i64::MAX, |mid| grid_index(mid, steps));
                    let angle = i as f64 / f64::from(steps);
                    let value = segment
                        .function
                        .evaluate_piece(curve.kind, angle, i >= split);
                    return Some(Sample {
                        angle,
                        value: curve.finish(value),
                    });
                }
            }
            self.segment += 1;
            self.cursor = None;
        }
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(curve.closing_sample())
    }
}

/// Difference of one displacement curve to a reference, sample by sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Distances {
    /// `curve - reference` at every sample angle.
    pub samples: Vec<Sample>,
    /// First sample with the smallest difference.
    pub min: Sample,
    /// First sample with the largest difference.
    pub max: Sample,
}

impl Distances {
    /// Subtract `reference` from `curve`.
    ///
    /// Both curves must be completely sampled at the same resolution.
    pub fn between(reference: &Curve, curve: &Curve) -> Result<Self> {
        if reference.steps != curve.steps || !reference.complete || !curve.complete {
            return Err(CamError::MismatchedCurves);
        }
        let samples: Vec<Sample> = reference
            .iter()
            .zip(curve.iter())
            .map(|(r, c)| Sample {
                angle: c.angle,
                value: c.value - r.value,
            })
            .collect();
        let first = *samples.first().ok_or(CamError::MismatchedCurves)?;
        let (min, max) = samples.iter().fold((first, first), |(lo, hi), &s| {
            (
                if s.value < lo.value { s } else { lo },
                if s.value > hi.value { s } else { hi },
            )
        });
        Ok(Self { samples, min, max })
    }
}
