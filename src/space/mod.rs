//! Space management service
//!
//! Spaces are user-owned grid instances, optionally seeded from a map
//! template. Placed static elements become the obstacle cells the
//! realtime engine validates movement against; that metadata is served
//! to the engine through the [`crate::engine::SpaceDirectory`] boundary.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

use crate::catalog::{placement_in_bounds, CatalogService, Dimensions, Element};
use crate::engine::{Position, SpaceDirectory, SpaceLookupError, SpaceMetadata};

/// A user-owned space instance.
#[derive(Debug, Clone)]
pub struct Space {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub dimensions: Dimensions,
}

/// One element placed in a space.
#[derive(Debug, Clone)]
pub struct PlacedElement {
    pub id: String,
    pub element: Element,
    pub x: i64,
    pub y: i64,
}

/// Space errors
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("space not found")]
    NotFound,

    #[error("not the space owner")]
    Forbidden,

    #[error("placement outside space bounds")]
    OutOfBounds,

    #[error("unknown element")]
    UnknownElement,

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<crate::catalog::CatalogError> for SpaceError {
    fn from(err: crate::catalog::CatalogError) -> Self {
        match err {
            crate::catalog::CatalogError::NotFound => SpaceError::UnknownElement,
            crate::catalog::CatalogError::Validation(msg) => SpaceError::Validation(msg),
            crate::catalog::CatalogError::Database(err) => SpaceError::Database(err),
        }
    }
}

/// CRUD and metadata service over spaces
pub struct SpaceService {
    pool: SqlitePool,
    catalog: CatalogService,
}

impl SpaceService {
    pub fn new(pool: SqlitePool) -> Self {
        let catalog = CatalogService::new(pool.clone());
        Self { pool, catalog }
    }

    /// Create a space. With a map id, the template's dimensions and
    /// placements are copied in; otherwise explicit dimensions are
    /// required and the space starts empty.
    pub async fn create_space(
        &self,
        owner_id: &str,
        name: &str,
        dimensions: Option<&str>,
        map_id: Option<&str>,
    ) -> Result<Space, SpaceError> {
        let (dims, placements) = match map_id {
            Some(map_id) => {
                let map = self
                    .catalog
                    .get_map(map_id)
                    .await?
                    .ok_or_else(|| SpaceError::Validation("unknown map".into()))?;
                (map.dimensions, map.placements)
            }
            None => {
                let dims: Dimensions = dimensions
                    .ok_or_else(|| SpaceError::Validation("dimensions required".into()))?
                    .parse()?;
                (dims, Vec::new())
            }
        };

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO spaces (id, name, owner_id, width, height, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(name)
        .bind(owner_id)
        .bind(dims.width)
        .bind(dims.height)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        for placement in &placements {
            sqlx::query(
                "INSERT INTO space_elements (id, space_id, element_id, x, y)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&id)
            .bind(&placement.element_id)
            .bind(placement.x)
            .bind(placement.y)
            .execute(&self.pool)
            .await?;
        }

        Ok(Space {
            id,
            name: name.to_string(),
            owner_id: owner_id.to_string(),
            dimensions: dims,
        })
    }

    /// Delete a space. Only the owner may delete it.
    pub async fn delete_space(&self, space_id: &str, requester_id: &str) -> Result<(), SpaceError> {
        let space = self.get_space(space_id).await?.ok_or(SpaceError::NotFound)?;
        if space.owner_id != requester_id {
            return Err(SpaceError::Forbidden);
        }

        sqlx::query("DELETE FROM spaces WHERE id = ?")
            .bind(space_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_space(&self, space_id: &str) -> Result<Option<Space>, SpaceError> {
        let row: Option<(String, String, String, u32, u32)> =
            sqlx::query_as("SELECT id, name, owner_id, width, height FROM spaces WHERE id = ?")
                .bind(space_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, name, owner_id, width, height)| Space {
            id,
            name,
            owner_id,
            dimensions: Dimensions { width, height },
        }))
    }

    /// All spaces owned by one user.
    pub async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Space>, SpaceError> {
        let rows: Vec<(String, String, String, u32, u32)> = sqlx::query_as(
            "SELECT id, name, owner_id, width, height FROM spaces
             WHERE owner_id = ? ORDER BY created_at",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, owner_id, width, height)| Space {
                id,
                name,
                owner_id,
                dimensions: Dimensions { width, height },
            })
            .collect())
    }

    /// The elements currently placed in a space, with their catalog data.
    pub async fn placed_elements(&self, space_id: &str) -> Result<Vec<PlacedElement>, SpaceError> {
        let rows: Vec<(String, String, String, u32, u32, bool, i64, i64)> = sqlx::query_as(
            "SELECT se.id, e.id, e.image_url, e.width, e.height, e.is_static, se.x, se.y
             FROM space_elements se JOIN elements e ON e.id = se.element_id
             WHERE se.space_id = ?",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(id, element_id, image_url, width, height, is_static, x, y)| PlacedElement {
                    id,
                    element: Element {
                        id: element_id,
                        image_url,
                        width,
                        height,
                        is_static,
                    },
                    x,
                    y,
                },
            )
            .collect())
    }

    /// Place an element into a space. The footprint must lie fully inside
    /// the space bounds; the same boundary rule movement validation uses.
    pub async fn add_element(
        &self,
        space_id: &str,
        element_id: &str,
        x: i64,
        y: i64,
    ) -> Result<PlacedElement, SpaceError> {
        let space = self.get_space(space_id).await?.ok_or(SpaceError::NotFound)?;
        let element = self
            .catalog
            .get_element(element_id)
            .await?
            .ok_or(SpaceError::UnknownElement)?;

        if !placement_in_bounds(&element, x, y, space.dimensions) {
            return Err(SpaceError::OutOfBounds);
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO space_elements (id, space_id, element_id, x, y) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(space_id)
        .bind(element_id)
        .bind(x)
        .bind(y)
        .execute(&self.pool)
        .await?;

        Ok(PlacedElement { id, element, x, y })
    }

    /// Remove a placed element by placement id.
    pub async fn remove_element(&self, placement_id: &str) -> Result<(), SpaceError> {
        let result = sqlx::query("DELETE FROM space_elements WHERE id = ?")
            .bind(placement_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(SpaceError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl SpaceDirectory for SpaceService {
    /// Resolve a space to engine metadata: dimensions plus every cell
    /// covered by a static element footprint.
    async fn resolve_space(&self, space_id: &str) -> Result<SpaceMetadata, SpaceLookupError> {
        let space = self
            .get_space(space_id)
            .await
            .map_err(|err| SpaceLookupError::Unavailable(err.to_string()))?
            .ok_or(SpaceLookupError::NotFound)?;

        let placed = self
            .placed_elements(space_id)
            .await
            .map_err(|err| SpaceLookupError::Unavailable(err.to_string()))?;

        let mut static_cells = HashSet::new();
        for placement in placed.iter().filter(|p| p.element.is_static) {
            for dx in 0..i64::from(placement.element.width) {
                for dy in 0..i64::from(placement.element.height) {
                    static_cells.insert(Position::new(placement.x + dx, placement.y + dy));
                }
            }
        }

        Ok(SpaceMetadata {
            width: space.dimensions.width,
            height: space.dimensions.height,
            static_cells,
        })
    }
}
