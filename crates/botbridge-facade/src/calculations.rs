//! Tile distance helpers

use botbridge_core::{Result, WorldPoint};
use botbridge_runtime::{ClientContext, WorldModel};

/// Distance and plane arithmetic. Only the `*_player` methods read the world.
pub struct Calculations<W> {
    ctx: ClientContext<W>,
}

impl<W> Clone for Calculations<W> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
        }
    }
}

impl<W: WorldModel> Calculations<W> {
    pub fn new(ctx: ClientContext<W>) -> Self {
        Self { ctx }
    }

    /// Tile distance; `u32::MAX` across planes
    pub fn distance(&self, a: &WorldPoint, b: &WorldPoint) -> u32 {
        a.distance_to(b)
    }

    /// `None` when there is no local actor
    pub fn distance_to_player(&self, point: &WorldPoint) -> Result<Option<u32>> {
        let local = self.ctx.local_position()?;
        Ok(local.map(|origin| origin.distance_to(point)))
    }

    pub fn same_plane(&self, a: &WorldPoint, b: &WorldPoint) -> bool {
        a.same_plane(b)
    }

    pub fn plane_difference(&self, a: &WorldPoint, b: &WorldPoint) -> u32 {
        a.plane_difference(b)
    }

    pub fn is_within_distance(&self, a: &WorldPoint, b: &WorldPoint, max: u32) -> bool {
        a.is_within_distance(b, max)
    }

    pub fn is_within_distance_of_player(&self, point: &WorldPoint, max: u32) -> Result<bool> {
        let local = self.ctx.local_position()?;
        Ok(local.is_some_and(|origin| origin.is_within_distance(point, max)))
    }
}

#[cfg(test)]
mod tests {
    use crate::ScriptApi;
    use crate::testing::{castle, start};
    use botbridge_core::WorldPoint;
    use botbridge_runtime::SimWorld;
    use tokio_test::assert_ok;

    #[test]
    fn test_player_relative_distances() {
        let (ctx, owner) = start(castle());
        let calc = ctx.calculations();
        let booth = WorldPoint::new(3208, 3221, 2);
        let kitchen = WorldPoint::new(3209, 3214, 0);

        assert_eq!(calc.distance(&booth, &WorldPoint::new(3211, 3219, 2)), 3);
        assert_eq!(calc.distance(&booth, &kitchen), u32::MAX);
        assert!(!calc.same_plane(&booth, &kitchen));
        assert_eq!(calc.plane_difference(&booth, &kitchen), 2);
        assert!(calc.is_within_distance(&booth, &booth, 0));

        assert_eq!(assert_ok!(calc.distance_to_player(&booth)), Some(1));
        assert!(assert_ok!(calc.is_within_distance_of_player(&booth, 1)));
        assert!(!assert_ok!(calc.is_within_distance_of_player(&kitchen, u32::MAX)));
        assert!(!calc.is_within_distance(&booth, &kitchen, u32::MAX));

        assert_ok!(ctx.submit(|world: &SimWorld| {
            world.set_local_position(None);
            Ok(())
        }));
        assert_eq!(assert_ok!(calc.distance_to_player(&booth)), None);
        assert!(!assert_ok!(calc.is_within_distance_of_player(&booth, 100)));
        assert_ok!(owner.shutdown());
    }
}
