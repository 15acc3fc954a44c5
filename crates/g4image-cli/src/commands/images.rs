use g4image_core::Image;

pub fn images() {
    let mut images = Image::ALL;
    images.sort_unstable_by_key(|image| image.as_str());
    for image in images {
        println!("{:<10} {}", image.as_str(), image.family());
    }
}
