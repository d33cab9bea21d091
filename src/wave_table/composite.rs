use {
    super::{
        Half, Render, Sine, TABLE_LEN, Triangle,
        arbitrary::{ArbTable, source_pos, zoomed},
    },
    crate::shape::{ArbParams, CompositeParams, ShapeParams},
};

/// Weighted sum of the zero centred sine, triangle and arbitrary waves
pub struct Composite<'a> {
    weights: CompositeParams,
    sine: Sine,
    triangle: Triangle,
    arb_params: ArbParams,
    arb: &'a ArbTable,
}

impl<'a> Composite<'a> {
    /// Prepare rendering the mix described by `params`
    #[must_use]
    pub fn new(params: &ShapeParams, arb: &'a ArbTable) -> Self {
        Self {
            weights: params.composite,
            sine: Sine::new(&params.sine),
            triangle: Triangle::new(&params.triangle),
            arb_params: params.arb,
            arb,
        }
    }
    #[expect(clippy::cast_precision_loss)]
    fn arb_part(&self, half: Half, index: usize) -> f32 {
        if self.weights.arbitrary == 0.0 {
            return 0.0;
        }
        let p = &self.arb_params;
        let src = zoomed(p, source_pos(p, half, index));
        (0.5 - p.vshift) * TABLE_LEN as f32
            + self.weights.arbitrary * p.amplitude * self.arb.sample(src) as f32
    }
}

impl Render for Composite<'_> {
    #[expect(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn render(&self, half: Half, index: usize) -> i32 {
        let w = &self.weights;
        let mut v = self.arb_part(half, index) as i32;
        if w.sine != 0.0 {
            v = (v as f32 + w.sine * self.sine.render(half, index) as f32) as i32;
        }
        if w.triangle != 0.0 {
            v = (v as f32 + w.triangle * self.triangle.render(half, index) as f32) as i32;
        }
        v
    }
}
