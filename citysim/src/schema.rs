use std::collections::BTreeSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Every column a CitySim export can contain. Declaration order is file order, so sorting
/// fields sorts them the way they appear in the CSV.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    FrameNum,
    CarId,
    // Pixel coordinates
    CarCenterX,
    CarCenterY,
    HeadX,
    HeadY,
    TailX,
    TailY,
    BoundingBox1X,
    BoundingBox1Y,
    BoundingBox2X,
    BoundingBox2Y,
    BoundingBox3X,
    BoundingBox3Y,
    BoundingBox4X,
    BoundingBox4Y,
    // Local planar coordinates, in feet
    CarCenterXft,
    CarCenterYft,
    HeadXft,
    HeadYft,
    TailXft,
    TailYft,
    BoundingBox1Xft,
    BoundingBox1Yft,
    BoundingBox2Xft,
    BoundingBox2Yft,
    BoundingBox3Xft,
    BoundingBox3Yft,
    BoundingBox4Xft,
    BoundingBox4Yft,
    // WGS84
    CarCenterLat,
    CarCenterLon,
    HeadLat,
    HeadLon,
    TailLat,
    TailLon,
    BoundingBox1Lat,
    BoundingBox1Lon,
    BoundingBox2Lat,
    BoundingBox2Lon,
    BoundingBox3Lat,
    BoundingBox3Lon,
    BoundingBox4Lat,
    BoundingBox4Lon,
    Speed,
    Heading,
    Course,
    LaneId,
}

pub const COLUMNS: [Field; 48] = [
    Field::FrameNum,
    Field::CarId,
    Field::CarCenterX,
    Field::CarCenterY,
    Field::HeadX,
    Field::HeadY,
    Field::TailX,
    Field::TailY,
    Field::BoundingBox1X,
    Field::BoundingBox1Y,
    Field::BoundingBox2X,
    Field::BoundingBox2Y,
    Field::BoundingBox3X,
    Field::BoundingBox3Y,
    Field::BoundingBox4X,
    Field::BoundingBox4Y,
    Field::CarCenterXft,
    Field::CarCenterYft,
    Field::HeadXft,
    Field::HeadYft,
    Field::TailXft,
    Field::TailYft,
    Field::BoundingBox1Xft,
    Field::BoundingBox1Yft,
    Field::BoundingBox2Xft,
    Field::BoundingBox2Yft,
    Field::BoundingBox3Xft,
    Field::BoundingBox3Yft,
    Field::BoundingBox4Xft,
    Field::BoundingBox4Yft,
    Field::CarCenterLat,
    Field::CarCenterLon,
    Field::HeadLat,
    Field::HeadLon,
    Field::TailLat,
    Field::TailLon,
    Field::BoundingBox1Lat,
    Field::BoundingBox1Lon,
    Field::BoundingBox2Lat,
    Field::BoundingBox2Lon,
    Field::BoundingBox3Lat,
    Field::BoundingBox3Lon,
    Field::BoundingBox4Lat,
    Field::BoundingBox4Lon,
    Field::Speed,
    Field::Heading,
    Field::Course,
    Field::LaneId,
];

/// CitySim reports speed in miles/hour. Converting to km/h the way downstream consumers expect
/// uses this factor.
const SPEED_SCALE: f64 = 0.44704;

impl Field {
    /// The CSV header name
    pub fn name(self) -> &'static str {
        match self {
            Field::FrameNum => "frameNum",
            Field::CarId => "carId",
            Field::CarCenterX => "carCenterX",
            Field::CarCenterY => "carCenterY",
            Field::HeadX => "headX",
            Field::HeadY => "headY",
            Field::TailX => "tailX",
            Field::TailY => "tailY",
            Field::BoundingBox1X => "boundingBox1X",
            Field::BoundingBox1Y => "boundingBox1Y",
            Field::BoundingBox2X => "boundingBox2X",
            Field::BoundingBox2Y => "boundingBox2Y",
            Field::BoundingBox3X => "boundingBox3X",
            Field::BoundingBox3Y => "boundingBox3Y",
            Field::BoundingBox4X => "boundingBox4X",
            Field::BoundingBox4Y => "boundingBox4Y",
            Field::CarCenterXft => "carCenterXft",
            Field::CarCenterYft => "carCenterYft",
            Field::HeadXft => "headXft",
            Field::HeadYft => "headYft",
            Field::TailXft => "tailXft",
            Field::TailYft => "tailYft",
            Field::BoundingBox1Xft => "boundingBox1Xft",
            Field::BoundingBox1Yft => "boundingBox1Yft",
            Field::BoundingBox2Xft => "boundingBox2Xft",
            Field::BoundingBox2Yft => "boundingBox2Yft",
            Field::BoundingBox3Xft => "boundingBox3Xft",
            Field::BoundingBox3Yft => "boundingBox3Yft",
            Field::BoundingBox4Xft => "boundingBox4Xft",
            Field::BoundingBox4Yft => "boundingBox4Yft",
            Field::CarCenterLat => "carCenterLat",
            Field::CarCenterLon => "carCenterLon",
            Field::HeadLat => "headLat",
            Field::HeadLon => "headLon",
            Field::TailLat => "tailLat",
            Field::TailLon => "tailLon",
            Field::BoundingBox1Lat => "boundingBox1Lat",
            Field::BoundingBox1Lon => "boundingBox1Lon",
            Field::BoundingBox2Lat => "boundingBox2Lat",
            Field::BoundingBox2Lon => "boundingBox2Lon",
            Field::BoundingBox3Lat => "boundingBox3Lat",
            Field::BoundingBox3Lon => "boundingBox3Lon",
            Field::BoundingBox4Lat => "boundingBox4Lat",
            Field::BoundingBox4Lon => "boundingBox4Lon",
            Field::Speed => "speed",
            Field::Heading => "heading",
            Field::Course => "course",
            Field::LaneId => "laneId",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        COLUMNS.into_iter().find(|f| f.name() == name)
    }

    /// carId and frameNum define grouping and ordering. They're always loaded and never
    /// treated as payload.
    pub fn is_identity(self) -> bool {
        matches!(self, Field::FrameNum | Field::CarId)
    }

    /// The factor applied at load time to bring this field into the units callers expect, if
    /// any.
    pub fn unit_scale(self) -> Option<f64> {
        match self {
            Field::Speed => Some(SPEED_SCALE),
            _ => None,
        }
    }

    pub fn is_convertible(self) -> bool {
        self.unit_scale().is_some()
    }
}

/// Which columns to read from a CitySim file. carId and frameNum are implied and always read;
/// only the payload columns are stored here, in file order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Field>", into = "Vec<Field>")]
pub struct ColumnSelection {
    payload: Vec<Field>,
}

impl ColumnSelection {
    pub fn all() -> Self {
        Self {
            payload: COLUMNS.into_iter().filter(|f| !f.is_identity()).collect(),
        }
    }

    /// Only the identity columns
    pub fn identity_only() -> Self {
        Self {
            payload: Vec::new(),
        }
    }

    /// Listing carId or frameNum is allowed but redundant. Listing anything twice is an error.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = BTreeSet::new();
        for field in &fields {
            if !seen.insert(*field) {
                bail!("Column {} selected twice", field.name());
            }
        }
        Ok(Self {
            payload: seen.into_iter().filter(|f| !f.is_identity()).collect(),
        })
    }

    pub fn from_names(names: &[&str]) -> Result<Self> {
        let mut fields = Vec::new();
        for name in names {
            match Field::from_name(name) {
                Some(f) => fields.push(f),
                None => bail!("Unknown CitySim column {name}"),
            }
        }
        Self::new(fields)
    }

    pub fn payload(&self) -> &[Field] {
        &self.payload
    }

    pub fn contains(&self, field: Field) -> bool {
        field.is_identity() || self.payload.contains(&field)
    }

    /// Everything that'll be read, identity columns included, in file order
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = vec![Field::FrameNum, Field::CarId];
        fields.extend(self.payload.iter().cloned());
        fields
    }
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<Field>> for ColumnSelection {
    type Error = anyhow::Error;

    fn try_from(fields: Vec<Field>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<ColumnSelection> for Vec<Field> {
    fn from(selection: ColumnSelection) -> Self {
        selection.fields()
    }
}
