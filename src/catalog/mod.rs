//! Catalog of admin-managed assets: elements, avatars, and map templates
//!
//! Elements are the building blocks placed on maps and in spaces; an
//! element flagged static blocks movement over its footprint. Maps are
//! reusable templates whose placements get copied into a space at
//! creation time.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use sqlx::SqlitePool;
use thiserror::Error;

/// Grid dimensions on the wire, written as `"WIDTHxHEIGHT"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

static DIMENSIONS_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,5})x(\d{1,5})$").unwrap());

impl FromStr for Dimensions {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = DIMENSIONS_REGEX
            .captures(s)
            .ok_or_else(|| CatalogError::Validation(format!("bad dimensions: {s:?}")))?;
        let width: u32 = caps[1].parse().unwrap_or(0);
        let height: u32 = caps[2].parse().unwrap_or(0);
        if width == 0 || height == 0 {
            return Err(CatalogError::Validation(format!("bad dimensions: {s:?}")));
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A placeable asset.
#[derive(Debug, Clone)]
pub struct Element {
    pub id: String,
    pub image_url: String,
    pub width: u32,
    pub height: u32,
    pub is_static: bool,
}

/// A user-selectable avatar.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    pub image_url: String,
}

/// One element placement within a map template.
#[derive(Debug, Clone)]
pub struct Placement {
    pub element_id: String,
    pub x: i64,
    pub y: i64,
}

/// A reusable space template.
#[derive(Debug, Clone)]
pub struct MapTemplate {
    pub id: String,
    pub thumbnail: String,
    pub dimensions: Dimensions,
    pub placements: Vec<Placement>,
}

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// CRUD service over the asset catalog
pub struct CatalogService {
    pool: SqlitePool,
}

impl CatalogService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_element(
        &self,
        image_url: &str,
        width: u32,
        height: u32,
        is_static: bool,
    ) -> Result<Element, CatalogError> {
        if width == 0 || height == 0 {
            return Err(CatalogError::Validation(
                "element dimensions must be positive".into(),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO elements (id, image_url, width, height, is_static, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(image_url)
        .bind(width)
        .bind(height)
        .bind(is_static)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Element {
            id,
            image_url: image_url.to_string(),
            width,
            height,
            is_static,
        })
    }

    pub async fn update_element_image(
        &self,
        element_id: &str,
        image_url: &str,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query("UPDATE elements SET image_url = ? WHERE id = ?")
            .bind(image_url)
            .bind(element_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound);
        }
        Ok(())
    }

    pub async fn get_element(&self, element_id: &str) -> Result<Option<Element>, CatalogError> {
        let row: Option<(String, String, u32, u32, bool)> = sqlx::query_as(
            "SELECT id, image_url, width, height, is_static FROM elements WHERE id = ?",
        )
        .bind(element_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, image_url, width, height, is_static)| Element {
            id,
            image_url,
            width,
            height,
            is_static,
        }))
    }

    pub async fn list_elements(&self) -> Result<Vec<Element>, CatalogError> {
        let rows: Vec<(String, String, u32, u32, bool)> = sqlx::query_as(
            "SELECT id, image_url, width, height, is_static FROM elements ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, image_url, width, height, is_static)| Element {
                id,
                image_url,
                width,
                height,
                is_static,
            })
            .collect())
    }

    pub async fn create_avatar(&self, name: &str, image_url: &str) -> Result<Avatar, CatalogError> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO avatars (id, name, image_url, created_at) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(name)
            .bind(image_url)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(Avatar {
            id,
            name: name.to_string(),
            image_url: image_url.to_string(),
        })
    }

    pub async fn list_avatars(&self) -> Result<Vec<Avatar>, CatalogError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT id, name, image_url FROM avatars ORDER BY created_at")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name, image_url)| Avatar {
                id,
                name,
                image_url,
            })
            .collect())
    }

    /// Create a map template. Every placement must reference an existing
    /// element and land fully inside the map bounds.
    pub async fn create_map(
        &self,
        thumbnail: &str,
        dimensions: Dimensions,
        placements: &[Placement],
    ) -> Result<MapTemplate, CatalogError> {
        for placement in placements {
            let element = self
                .get_element(&placement.element_id)
                .await?
                .ok_or_else(|| {
                    CatalogError::Validation(format!(
                        "unknown element: {}",
                        placement.element_id
                    ))
                })?;
            if !placement_in_bounds(&element, placement.x, placement.y, dimensions) {
                return Err(CatalogError::Validation(format!(
                    "placement at ({}, {}) outside {}",
                    placement.x, placement.y, dimensions
                )));
            }
        }

        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO maps (id, thumbnail, width, height, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(thumbnail)
        .bind(dimensions.width)
        .bind(dimensions.height)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        for placement in placements {
            sqlx::query(
                "INSERT INTO map_elements (id, map_id, element_id, x, y) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&id)
            .bind(&placement.element_id)
            .bind(placement.x)
            .bind(placement.y)
            .execute(&self.pool)
            .await?;
        }

        Ok(MapTemplate {
            id,
            thumbnail: thumbnail.to_string(),
            dimensions,
            placements: placements.to_vec(),
        })
    }

    pub async fn get_map(&self, map_id: &str) -> Result<Option<MapTemplate>, CatalogError> {
        let row: Option<(String, String, u32, u32)> =
            sqlx::query_as("SELECT id, thumbnail, width, height FROM maps WHERE id = ?")
                .bind(map_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some((id, thumbnail, width, height)) = row else {
            return Ok(None);
        };

        let placements: Vec<(String, i64, i64)> =
            sqlx::query_as("SELECT element_id, x, y FROM map_elements WHERE map_id = ?")
                .bind(&id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(MapTemplate {
            id,
            thumbnail,
            dimensions: Dimensions { width, height },
            placements: placements
                .into_iter()
                .map(|(element_id, x, y)| Placement { element_id, x, y })
                .collect(),
        }))
    }
}

/// Whether an element footprint anchored at (x, y) lies fully inside the
/// given dimensions. The same boundary rule the movement engine applies
/// to occupants, extended over the element's width and height.
pub fn placement_in_bounds(element: &Element, x: i64, y: i64, dims: Dimensions) -> bool {
    x >= 0
        && y >= 0
        && x + i64::from(element.width) <= i64::from(dims.width)
        && y + i64::from(element.height) <= i64::from(dims.height)
}
