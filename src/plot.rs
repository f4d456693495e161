use log::debug;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

use crate::records::Record;

/// Side length of the square drawing surface, in pixels.
pub const CANVAS_SIZE: f64 = 400.0;
/// Diameter of each house marker, in pixels.
pub const MARKER_DIAMETER: f64 = 5.0;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no records to plot")]
    EmptyDataset,
    #[error("all records share the same {axis}; cannot scale to the canvas")]
    DegenerateExtent { axis: &'static str },
    #[error("rendering failed: {0}")]
    Backend(String),
}

/// Coordinate bounding box of a record set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_long: f64,
    pub max_long: f64,
}

impl Bounds {
    /// Single linear scan over the records. Zero records, or a zero-width
    /// span on either axis (including the single-record case), is rejected
    /// so the projection can never divide by zero.
    pub fn scan<'a, I>(records: I) -> Result<Self, PlotError>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut iter = records.into_iter();
        let first = iter.next().ok_or(PlotError::EmptyDataset)?;
        let mut bounds = Bounds {
            min_lat: first.latitude,
            max_lat: first.latitude,
            min_long: first.longitude,
            max_long: first.longitude,
        };

        for record in iter {
            bounds.min_lat = bounds.min_lat.min(record.latitude);
            bounds.max_lat = bounds.max_lat.max(record.latitude);
            bounds.min_long = bounds.min_long.min(record.longitude);
            bounds.max_long = bounds.max_long.max(record.longitude);
        }

        if bounds.max_lat == bounds.min_lat {
            return Err(PlotError::DegenerateExtent { axis: "latitude" });
        }
        if bounds.max_long == bounds.min_long {
            return Err(PlotError::DegenerateExtent { axis: "longitude" });
        }

        Ok(bounds)
    }

    /// Min-max scaling of a record's coordinates into `[0, size]` on both
    /// axes. Longitude grows rightwards, latitude grows downwards to match
    /// the drawing surface's coordinate system.
    fn project(&self, record: &Record, size: f64) -> (f64, f64) {
        let x = size * (record.longitude - self.min_long) / (self.max_long - self.min_long);
        let y = size * (record.latitude - self.min_lat) / (self.max_lat - self.min_lat);
        (x, y)
    }
}

/// A primitive consumable by any 2D rendering surface. Coordinates are the
/// marker center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    FilledCircle { x: f64, y: f64, diameter: f64 },
}

/// Computes the bounding box of the given records and emits one marker per
/// record, scaled to the canvas.
pub fn plot_records<'a, I>(records: I) -> Result<Vec<DrawCommand>, PlotError>
where
    I: IntoIterator<Item = &'a Record>,
{
    let records: Vec<&Record> = records.into_iter().collect();
    let bounds = Bounds::scan(records.iter().copied())?;
    debug!("plotting {} records within {bounds:?}", records.len());

    Ok(records
        .iter()
        .map(|record| {
            let (x, y) = bounds.project(record, CANVAS_SIZE);
            DrawCommand::FilledCircle {
                x,
                y,
                diameter: MARKER_DIAMETER,
            }
        })
        .collect())
}

/// Renders the draw commands to an SVG file: white background, black
/// border, black markers.
pub fn render_svg<P: AsRef<Path>>(commands: &[DrawCommand], path: P) -> Result<(), PlotError> {
    let size = CANVAS_SIZE as u32;
    let root = SVGBackend::new(path.as_ref(), (size, size)).into_drawing_area();

    root.fill(&WHITE).map_err(backend_error)?;
    root.draw(&Rectangle::new(
        [(0, 0), (size as i32 - 1, size as i32 - 1)],
        ShapeStyle::from(&BLACK),
    ))
    .map_err(backend_error)?;

    for command in commands {
        match command {
            DrawCommand::FilledCircle { x, y, diameter } => {
                root.draw(&Circle::new(
                    (x.round() as i32, y.round() as i32),
                    (diameter / 2.0).round() as i32,
                    BLACK.filled(),
                ))
                .map_err(backend_error)?;
            }
        }
    }

    root.present().map_err(backend_error)?;
    Ok(())
}

fn backend_error<E: std::error::Error>(err: E) -> PlotError {
    PlotError::Backend(err.to_string())
}
