use anyhow::{Result, bail};
use camwatch_core::{CameraDescriptor, CameraDirectory, HttpCameraDirectory};
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};

use super::ServerContext;

#[derive(Args)]
pub struct CamerasArgs {
    /// Server URL (overrides config)
    #[arg(long)]
    pub server: Option<String>,
}

pub async fn run(args: CamerasArgs) -> Result<()> {
    let ctx = ServerContext::load(args.server.as_deref())?;
    let Some(token) = ctx.auth.token() else {
        bail!("Not logged in. Run `camwatch login` first.");
    };

    let directory = HttpCameraDirectory::new(ctx.endpoints.clone());
    let cameras = directory.list_cameras(&token).await?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("{}", cameras_table(&cameras));
    Ok(())
}

fn cameras_table(cameras: &[CameraDescriptor]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("ID").fg(Color::Cyan),
        Cell::new("Name").fg(Color::Cyan),
        Cell::new("Device").fg(Color::Cyan),
        Cell::new("Resolution").fg(Color::Cyan),
        Cell::new("FPS").fg(Color::Cyan),
    ]);

    for camera in cameras {
        let (device, resolution, fps) = match &camera.infos {
            Some(infos) => (
                infos.device_id.to_string(),
                format!("{}x{}", infos.width, infos.height),
                format!("{}", infos.fps),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };

        table.add_row(vec![
            Cell::new(camera.id),
            Cell::new(camera.label()),
            Cell::new(device),
            Cell::new(resolution),
            Cell::new(fps),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use camwatch_core::CameraInfos;

    #[test]
    fn table_lists_each_camera() {
        let mut porch = CameraDescriptor::new(2).with_name("Porch");
        porch.infos = Some(CameraInfos {
            device_id: 2,
            width: 1280,
            height: 720,
            fps: 30.0,
        });
        let cameras = vec![porch, CameraDescriptor::new(5)];

        let rendered = cameras_table(&cameras).to_string();

        assert!(rendered.contains("Porch"));
        assert!(rendered.contains("1280x720"));
        assert!(rendered.contains("Camera 5"));
    }
}
