use std::sync::Arc;

use crate::application::catalog::CatalogService;
use crate::application::repos::HealthRepo;
use crate::application::rotation::RotationService;

#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub rotation: Arc<RotationService>,
    pub health: Arc<dyn HealthRepo>,
}
