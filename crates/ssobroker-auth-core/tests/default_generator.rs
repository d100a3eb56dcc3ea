//! The process-level default generator
//!
//! Kept in its own test binary so installing the default cannot leak into
//! tests that expect none to be bound.

use serde_json::Value;
use ssobroker_auth_core::{
    clear_default_generator, create_default_generator, default_generator,
    install_default_generator, AuthError, Credentials, TokenConfig,
};

#[test]
fn test_default_generator_lifecycle() {
    assert!(default_generator().is_none());
    let crd = Credentials::new("me", Vec::<(String, Value)>::new());
    assert!(matches!(crd.create_token(None), Err(AuthError::Configuration(_))));

    let generator = create_default_generator(&TokenConfig::new("s3cr3t").with_lifetime(600)).unwrap();
    assert_eq!(default_generator().map(|g| g.lifetime()), Some(600));

    let previous = install_default_generator(generator);
    assert_eq!(previous.map(|g| g.lifetime()), Some(600));

    // records bind the default at construction
    let crd = Credentials::new("me", Vec::<(String, Value)>::new());
    assert!(crd.create_token(None).is_ok());

    assert!(clear_default_generator().is_some());
    assert!(default_generator().is_none());
    assert!(crd.create_token(None).is_ok());
    assert!(Credentials::new("me", Vec::<(String, Value)>::new())
        .create_token(None)
        .is_err());

    assert!(matches!(
        create_default_generator(&TokenConfig::new("")),
        Err(AuthError::Configuration(_))
    ));
    assert!(default_generator().is_none());
}
