use crate::error::Result;
use crate::network::params::Params;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }

    /// Applies `p -= learning_rate * g` to every parameter in place.
    ///
    /// `grads` must have the same layout as `params`, as returned by a
    /// training pass of the same network.
    pub fn step(&self, params: &mut Params, grads: &Params) -> Result<()> {
        grads.check_layout(&params.layout())?;

        let lr = self.learning_rate;
        for (p, g) in params.layers.iter_mut().zip(&grads.layers) {
            p.weight.scaled_add(-lr, &g.weight);
            p.bias.scaled_add(-lr, &g.bias);
            if let (Some(pn), Some(gn)) = (p.norm.as_mut(), g.norm.as_ref()) {
                pn.gamma.scaled_add(-lr, &gn.gamma);
                pn.beta.scaled_add(-lr, &gn.beta);
            }
        }
        Ok(())
    }
}
