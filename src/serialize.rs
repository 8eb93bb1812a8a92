use serde::Serialize;
use std::io::Write;
use tar::{Builder, Header};

use crate::trajectory::Trajectory;
use crate::Time;

/// Serializes one object as JSON and appends it to a tar archive under the
/// given path.
pub fn write_entry<W: Write>(
    path: String,
    data: &impl Serialize,
    archive: &mut Builder<W>,
) -> Result<(), Box<dyn std::error::Error + 'static>> {
    let data = serde_json::to_string(data)?.into_bytes();

    let mut header = Header::new_gnu();
    header.set_path(path)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o664);
    header.set_cksum();

    archive.append(&header, &data as &[u8])?;
    Ok(())
}

/// Writes a recorded trajectory under `dir/` in the archive: the snapshot
/// times as one entry, then one frame entry per snapshot.
pub fn write_trajectory<W: Write, G: Serialize>(
    dir: &str,
    trajectory: &Trajectory<G>,
    archive: &mut Builder<W>,
) -> Result<(), Box<dyn std::error::Error + 'static>> {
    let times: Vec<Time> = trajectory.iter().map(|(t, _)| *t).collect();
    write_entry(format!("{}/times.json", dir), &times, archive)?;
    for (i, (_, grid)) in trajectory.iter().enumerate() {
        write_entry(format!("{}/frame_{:04}.json", dir, i), grid, archive)?;
    }
    Ok(())
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::grid::Cursor1D;
    use ndarray::arr1;

    #[test]
    fn archive_contains_times_and_frames() {
        let grid = Cursor1D::new(3, |i| arr1(&[i as i32]));
        let trajectory: Trajectory<_> = vec![(0.0, grid.clone()), (1.0, grid)];

        let mut archive = Builder::new(Vec::new());
        write_trajectory("run", &trajectory, &mut archive).unwrap();
        let bytes = archive.into_inner().unwrap();

        let mut reader = tar::Archive::new(&bytes[..]);
        let paths: Vec<String> = reader
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            paths,
            vec!["run/times.json", "run/frame_0000.json", "run/frame_0001.json"]
        );
    }

    #[test]
    fn grids_round_trip_through_json() {
        let grid = Cursor1D::new(2, |i| arr1(&[i as i32, 5]));
        let json = serde_json::to_string(&grid).unwrap();
        let back: Cursor1D<crate::Counts> = serde_json::from_str(&json).unwrap();
        assert_eq!(grid, back);
    }
}
