use time::Instant;

fn main() {
    let n = 10_000;
    let start = Instant::now();
    for _ in 0 .. n {
        splash_clean::sanitize(r##"
        <p>We&rsquo;ve made <a href="http://staff.tumblr.com/post/69608789310/love-the-new-search">search</a>
        better. Find posts by <a href="/tagged/search" onclick="track()">tag</a>, by blog,
        or by <b>keyword<i>, all at once</b>.</p>
        <figure><img src="http://37.media.tumblr.com/foo.png" alt="The new search page">
        <figcaption>Screenshots via <a href="http://imgur.com/">imgur</a>
        <img src="http://idioticimages.com/foo.gif"></figcaption></figure>
        <script>alert("hi");</script>
        "##, "staff").unwrap();
    }
    println!("{} nanoseconds to clean up a post body.", (Instant::now() - start).whole_nanoseconds() / n);
}
