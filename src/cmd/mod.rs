/// Asset statistics command.
pub mod info;
/// Pipeline command.
pub mod optimize;
/// Container packing command.
pub mod pack;
/// Container unpacking command.
pub mod unpack;

mod util;
